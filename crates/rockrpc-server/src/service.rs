//! Service metadata: the immutable description of a service's methods
//!
//! A [`ServiceClass`] is built once per service type from the type's
//! [`ServiceDefinition`] (usually generated by `#[rpc_service]`), adjusted by
//! any process-wide [`ServiceClassReflector`]s and [`ServiceClassModifier`]s,
//! and cached for the rest of the process.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rockrpc_json::conversion::{AnyBox, Reflect, TypeInfo, TypeKind, short_type_name};
use tracing::{debug, info};

use crate::error::{InvokeError, MetadataError};
use crate::handler::{Arguments, FnHandler, MethodHandler};

/// Describes the RPC surface of a service type
pub trait ServiceDefinition: Any + Send + Sync + Sized {
    fn describe(builder: &mut ServiceClassBuilder);
}

/// A service instance the dispatcher can call into
pub trait RpcService: Any + Send + Sync {
    fn service_class(&self) -> Result<Arc<ServiceClass>, MetadataError>;

    fn as_any(&self) -> &dyn Any;
}

impl<T: ServiceDefinition> RpcService for T {
    fn service_class(&self) -> Result<Arc<ServiceClass>, MetadataError> {
        ServiceClass::for_type::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One parameter of a method
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    name: String,
    type_info: TypeInfo,
    position: usize,
    variadic: bool,
}

impl ParameterDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// One exposed method of a service
pub struct MethodDescriptor {
    internal_name: String,
    name: String,
    description: Option<String>,
    obsolete: Option<String>,
    result_type: TypeInfo,
    parameters: Vec<ParameterDescriptor>,
    handler: Arc<dyn MethodHandler>,
    service: Weak<ServiceClass>,
}

impl MethodDescriptor {
    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    /// External name callers use
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn obsolete(&self) -> Option<&str> {
        self.obsolete.as_deref()
    }

    pub fn is_obsolete(&self) -> bool {
        self.obsolete.is_some()
    }

    pub fn result_type(&self) -> &TypeInfo {
        &self.result_type
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn find_parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn is_variadic(&self) -> bool {
        self.parameters.last().is_some_and(|p| p.variadic)
    }

    /// Parameters before the variadic one, or all of them
    pub fn fixed_parameter_count(&self) -> usize {
        if self.is_variadic() {
            self.parameters.len() - 1
        } else {
            self.parameters.len()
        }
    }

    /// The owning service class, alive as long as the class is
    pub fn service(&self) -> Option<Arc<ServiceClass>> {
        self.service.upgrade()
    }

    /// Call the method on `service` with one imported value per parameter
    pub fn invoke(&self, service: &dyn Any, args: Vec<AnyBox>) -> Result<AnyBox, InvokeError> {
        if args.len() != self.parameters.len() {
            return Err(InvokeError::invocation(format!(
                "The method '{}' expects {} argument(s) but received {}.",
                self.name,
                self.parameters.len(),
                args.len()
            )));
        }
        self.handler.invoke(service, Arguments::new(args))
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("internal_name", &self.internal_name)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("obsolete", &self.obsolete)
            .field("result_type", &self.result_type)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// The immutable method table of one service type
#[derive(Debug)]
pub struct ServiceClass {
    name: String,
    description: Option<String>,
    methods: Vec<Arc<MethodDescriptor>>,
    by_name: HashMap<String, usize>,
}

static SERVICE_CLASSES: Lazy<RwLock<HashMap<TypeId, Arc<ServiceClass>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

impl ServiceClass {
    /// The cached class of `T`, built on first use
    pub fn for_type<T: ServiceDefinition>() -> Result<Arc<ServiceClass>, MetadataError> {
        let key = TypeId::of::<T>();
        if let Some(class) = SERVICE_CLASSES.read().get(&key) {
            return Ok(Arc::clone(class));
        }

        // Built outside the lock; a racing builder of the same type loses.
        let class = Self::reflect::<T>(metadata_extensions())?;
        let mut classes = SERVICE_CLASSES.write();
        Ok(Arc::clone(classes.entry(key).or_insert(class)))
    }

    /// Build a fresh, uncached class for `T` with the given extensions
    pub fn reflect<T: ServiceDefinition>(
        extensions: &MetadataExtensions,
    ) -> Result<Arc<ServiceClass>, MetadataError> {
        let mut builder = ServiceClassBuilder::new(short_type_name(type_name::<T>()));
        T::describe(&mut builder);
        extensions.apply(TypeId::of::<T>(), &mut builder);
        let class = builder.build()?;
        info!(
            service = %class.name,
            methods = class.methods.len(),
            "Built service class"
        );
        Ok(class)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn methods(&self) -> &[Arc<MethodDescriptor>] {
        &self.methods
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|m| m.name()).collect()
    }

    pub fn find_method(&self, name: &str) -> Option<&Arc<MethodDescriptor>> {
        let method = self.by_name.get(name).map(|&index| &self.methods[index]);
        if method.is_none() {
            debug!(service = %self.name, method = name, "No such method");
        }
        method
    }
}

/// Collects a service class; the registration surface `#[rpc_service]` targets
pub struct ServiceClassBuilder {
    name: String,
    description: Option<String>,
    methods: Vec<MethodBuilder>,
}

impl ServiceClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn add_method(&mut self, method: MethodBuilder) -> &mut Self {
        self.methods.push(method);
        self
    }

    pub fn methods(&self) -> &[MethodBuilder] {
        &self.methods
    }

    pub fn methods_mut(&mut self) -> &mut [MethodBuilder] {
        &mut self.methods
    }

    pub fn find_method_mut(&mut self, name: &str) -> Option<&mut MethodBuilder> {
        self.methods.iter_mut().find(|m| m.name == name)
    }

    pub fn remove_method(&mut self, name: &str) -> Option<MethodBuilder> {
        let index = self.methods.iter().position(|m| m.name == name)?;
        Some(self.methods.remove(index))
    }

    /// Validate and freeze the collected methods
    pub fn build(self) -> Result<Arc<ServiceClass>, MetadataError> {
        let mut by_name = HashMap::with_capacity(self.methods.len());
        for (index, method) in self.methods.iter().enumerate() {
            method.validate(&self.name)?;
            if by_name.insert(method.name.clone(), index).is_some() {
                return Err(MetadataError::DuplicateMethod {
                    service: self.name.clone(),
                    method: method.name.clone(),
                });
            }
        }

        let ServiceClassBuilder {
            name,
            description,
            methods,
        } = self;
        Ok(Arc::new_cyclic(|service: &Weak<ServiceClass>| {
            let methods = methods
                .into_iter()
                .filter_map(|method| method.finish(service.clone()))
                .map(Arc::new)
                .collect();
            ServiceClass {
                name,
                description,
                methods,
                by_name,
            }
        }))
    }
}

struct PendingParameter {
    name: String,
    type_info: TypeInfo,
    variadic: bool,
}

/// Describes one method before the class is built
pub struct MethodBuilder {
    name: String,
    internal_name: Option<String>,
    description: Option<String>,
    obsolete: Option<String>,
    result_type: TypeInfo,
    parameters: Vec<PendingParameter>,
    handler: Option<Arc<dyn MethodHandler>>,
}

impl MethodBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            internal_name: None,
            description: None,
            obsolete: None,
            result_type: <()>::type_info(),
            parameters: Vec::new(),
            handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn internal_name(mut self, name: impl Into<String>) -> Self {
        self.internal_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn obsolete(mut self, message: impl Into<String>) -> Self {
        self.obsolete = Some(message.into());
        self
    }

    pub fn set_obsolete(&mut self, message: Option<String>) -> &mut Self {
        self.obsolete = message;
        self
    }

    pub fn returns<T: Reflect>(mut self) -> Self {
        self.result_type = T::type_info();
        self
    }

    pub fn param<T: Reflect>(self, name: impl Into<String>) -> Self {
        self.push_param(name.into(), T::type_info(), false)
    }

    /// Final parameter collecting surplus positional arguments
    pub fn variadic<T: Reflect>(self, name: impl Into<String>) -> Self {
        self.push_param(name.into(), T::type_info(), true)
    }

    pub fn handler<S, F>(mut self, f: F) -> Self
    where
        S: Any,
        F: Fn(&S, &mut Arguments) -> Result<AnyBox, InvokeError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(FnHandler::new(f)));
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn MethodHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Parameter names in declaration order
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn rename_parameter(&mut self, from: &str, to: impl Into<String>) -> bool {
        match self.parameters.iter_mut().find(|p| p.name == from) {
            Some(parameter) => {
                parameter.name = to.into();
                true
            }
            None => false,
        }
    }

    fn push_param(mut self, name: String, type_info: TypeInfo, variadic: bool) -> Self {
        self.parameters.push(PendingParameter {
            name,
            type_info,
            variadic,
        });
        self
    }

    fn validate(&self, service: &str) -> Result<(), MetadataError> {
        if self.name.is_empty() {
            return Err(MetadataError::EmptyMethodName {
                service: service.to_string(),
                method: self.internal_name.clone().unwrap_or_default(),
            });
        }
        let last = self.parameters.len().saturating_sub(1);
        for (position, parameter) in self.parameters.iter().enumerate() {
            if !parameter.variadic {
                continue;
            }
            if position != last {
                return Err(MetadataError::VariadicNotLast {
                    method: self.name.clone(),
                    parameter: parameter.name.clone(),
                });
            }
            if !matches!(parameter.type_info.kind(), TypeKind::Sequence(_)) {
                return Err(MetadataError::VariadicNotSequence {
                    method: self.name.clone(),
                    parameter: parameter.name.clone(),
                });
            }
        }
        if self.handler.is_none() {
            return Err(MetadataError::MissingHandler {
                method: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Only called after `validate`, so the handler is present
    fn finish(self, service: Weak<ServiceClass>) -> Option<MethodDescriptor> {
        let handler = self.handler?;
        let parameters = self
            .parameters
            .into_iter()
            .enumerate()
            .map(|(position, p)| ParameterDescriptor {
                name: p.name,
                type_info: p.type_info,
                position,
                variadic: p.variadic,
            })
            .collect();
        Some(MethodDescriptor {
            internal_name: self.internal_name.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            description: self.description,
            obsolete: self.obsolete,
            result_type: self.result_type,
            parameters,
            handler,
            service,
        })
    }
}

impl fmt::Debug for MethodBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodBuilder")
            .field("name", &self.name)
            .field("parameters", &self.parameter_names())
            .finish_non_exhaustive()
    }
}

/// Contributes methods while a service class is being built
pub trait ServiceClassReflector: Send + Sync {
    fn reflect(&self, service_type: TypeId, builder: &mut ServiceClassBuilder);
}

/// Adjusts collected metadata after all reflectors ran
pub trait ServiceClassModifier: Send + Sync {
    fn modify(&self, service_type: TypeId, builder: &mut ServiceClassBuilder);
}

/// Reflectors and modifiers applied to every service class build
///
/// Classes already cached by [`ServiceClass::for_type`] are not rebuilt when
/// an extension is added later.
#[derive(Default)]
pub struct MetadataExtensions {
    reflectors: RwLock<Vec<Arc<dyn ServiceClassReflector>>>,
    modifiers: RwLock<Vec<Arc<dyn ServiceClassModifier>>>,
}

impl MetadataExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_reflector(&self, reflector: impl ServiceClassReflector + 'static) {
        self.reflectors.write().push(Arc::new(reflector));
    }

    pub fn add_modifier(&self, modifier: impl ServiceClassModifier + 'static) {
        self.modifiers.write().push(Arc::new(modifier));
    }

    fn apply(&self, service_type: TypeId, builder: &mut ServiceClassBuilder) {
        let reflectors = self.reflectors.read().clone();
        for reflector in reflectors {
            reflector.reflect(service_type, builder);
        }
        let modifiers = self.modifiers.read().clone();
        for modifier in modifiers {
            modifier.modify(service_type, builder);
        }
    }
}

impl fmt::Debug for MetadataExtensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataExtensions")
            .field("reflectors", &self.reflectors.read().len())
            .field("modifiers", &self.modifiers.read().len())
            .finish()
    }
}

static METADATA_EXTENSIONS: Lazy<MetadataExtensions> = Lazy::new(MetadataExtensions::new);

/// Process-wide extensions used by [`ServiceClass::for_type`]
pub fn metadata_extensions() -> &'static MetadataExtensions {
    &METADATA_EXTENSIONS
}
