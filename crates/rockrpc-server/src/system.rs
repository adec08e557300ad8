//! Introspection methods answered on behalf of every service
//!
//! `system.listMethods`, `system.methodHelp` and `system.about` are described
//! with `#[rpc_service]` like any other service and bound to the class of the
//! service being dispatched to. A service method with the same name wins.

use std::sync::Arc;

use rockrpc_json::JsonComponent;
use thiserror::Error;

use crate::error::MetadataError;
use crate::service::ServiceClass;
use crate::rpc_service;

/// Introspection view over a target service class
#[derive(Debug)]
pub struct SystemService {
    class: Arc<ServiceClass>,
}

#[derive(Debug, Error)]
#[error("The method '{0}' is not exposed by this service.")]
pub struct UnknownMethodError(String);

/// Result of `system.about`
#[derive(Debug, Clone, Default, PartialEq, JsonComponent)]
pub struct ServiceSummary {
    pub name: String,
    pub description: Option<String>,
    pub methods: Vec<MethodSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, JsonComponent)]
pub struct MethodSummary {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Vec<String>,
    pub obsolete: Option<String>,
}

#[rpc_service(name = "system", description = "Introspection of the target service")]
impl SystemService {
    #[rpc_method(
        name = "system.listMethods",
        description = "Returns the names of all methods exposed by the service."
    )]
    pub fn list_methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .class
            .method_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        if let Ok(system) = system_class() {
            for name in system.method_names() {
                if self.class.find_method(name).is_none() {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    #[rpc_method(
        name = "system.methodHelp",
        description = "Returns the help text of a method."
    )]
    pub fn method_help(&self, name: String) -> Result<String, UnknownMethodError> {
        let method = match self.class.find_method(&name) {
            Some(method) => Arc::clone(method),
            None => system_class()
                .ok()
                .and_then(|system| system.find_method(&name).cloned())
                .ok_or(UnknownMethodError(name))?,
        };
        Ok(method.description().unwrap_or_default().to_string())
    }

    #[rpc_method(
        name = "system.about",
        description = "Describes the service and its methods."
    )]
    pub fn about(&self) -> ServiceSummary {
        ServiceSummary {
            name: self.class.name().to_string(),
            description: self.class.description().map(str::to_string),
            methods: self
                .class
                .methods()
                .iter()
                .map(|method| MethodSummary {
                    name: method.name().to_string(),
                    description: method.description().map(str::to_string),
                    parameters: method
                        .parameters()
                        .iter()
                        .map(|p| p.name().to_string())
                        .collect(),
                    obsolete: method.obsolete().map(str::to_string),
                })
                .collect(),
        }
    }
}

impl SystemService {
    pub fn new(class: Arc<ServiceClass>) -> Self {
        Self { class }
    }

    pub fn target(&self) -> &Arc<ServiceClass> {
        &self.class
    }
}

/// The cached class describing the system methods
pub fn system_class() -> Result<Arc<ServiceClass>, MetadataError> {
    ServiceClass::for_type::<SystemService>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Arguments;
    use crate::service::{MethodBuilder, ServiceClassBuilder};
    use crate::{AnyBox, InvokeError};

    struct Shop;

    fn shop_class() -> Arc<ServiceClass> {
        let mut builder = ServiceClassBuilder::new("Shop");
        builder.set_description("Sells things");
        builder.add_method(
            MethodBuilder::new("buy")
                .description("Buys an item")
                .param::<String>("item")
                .param::<u32>("count")
                .handler(|_: &Shop, _: &mut Arguments| -> Result<AnyBox, InvokeError> {
                    Ok(Box::new(()))
                }),
        );
        builder.add_method(
            MethodBuilder::new("system.methodHelp")
                .obsolete("Shadows the built-in.")
                .handler(|_: &Shop, _: &mut Arguments| -> Result<AnyBox, InvokeError> {
                    Ok(Box::new(()))
                }),
        );
        builder.build().unwrap()
    }

    #[test]
    fn test_system_class_methods() {
        let class = system_class().unwrap();
        assert_eq!(class.name(), "system");
        assert_eq!(
            class.method_names(),
            vec!["system.listMethods", "system.methodHelp", "system.about"]
        );
        assert_eq!(
            class.find_method("system.methodHelp").unwrap().parameters()[0].name(),
            "name"
        );
    }

    #[test]
    fn test_list_methods_skips_shadowed() {
        let system = SystemService::new(shop_class());
        assert_eq!(
            system.list_methods(),
            vec!["buy", "system.methodHelp", "system.listMethods", "system.about"]
        );
    }

    #[test]
    fn test_method_help() {
        let system = SystemService::new(shop_class());
        assert_eq!(system.method_help("buy".into()).unwrap(), "Buys an item");
        assert_eq!(
            system.method_help("system.about".into()).unwrap(),
            "Describes the service and its methods."
        );
        assert!(system.method_help("sell".into()).is_err());
    }

    #[test]
    fn test_about() {
        let about = SystemService::new(shop_class()).about();
        assert_eq!(about.name, "Shop");
        assert_eq!(about.description.as_deref(), Some("Sells things"));
        assert_eq!(about.methods[0].parameters, vec!["item", "count"]);
        assert_eq!(
            about.methods[1].obsolete.as_deref(),
            Some("Shadows the built-in.")
        );
    }
}
