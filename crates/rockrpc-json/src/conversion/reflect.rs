//! Static type descriptors
//!
//! Converter families decide what they can handle by looking at a
//! [`TypeInfo`]. Each describable type hands one out through [`Reflect`];
//! containers describe their element types lazily through function pointers
//! so recursive types stay finite.

use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{JsonError, JsonResult};
use crate::reader::JsonReader;
use crate::writer::JsonWrite;

use super::context::{ExportContext, ImportContext};

/// Owned, type-erased value produced by importers
pub type AnyBox = Box<dyn Any + Send>;

/// A type that can describe itself to the conversion registries
pub trait Reflect: Any + Send {
    fn type_info() -> TypeInfo;
}

#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
}

/// Structural shape of a type, as seen by converter families
#[derive(Clone, Copy)]
pub enum TypeKind {
    Primitive,
    Sequence(SequenceInfo),
    Map(MapInfo),
    Optional(OptionalInfo),
    Enum(&'static EnumInfo),
    Component(&'static ComponentInfo),
    SelfDescribing(SelfDescribingInfo),
    /// Known to the type system but not to any stock family
    Opaque,
}

#[derive(Clone, Copy)]
pub struct SequenceInfo {
    pub element: fn() -> TypeInfo,
    pub items: fn(&dyn Any) -> Vec<&dyn Any>,
    pub build: fn(Vec<AnyBox>) -> JsonResult<AnyBox>,
}

/// String-keyed map
#[derive(Clone, Copy)]
pub struct MapInfo {
    pub value: fn() -> TypeInfo,
    pub entries: fn(&dyn Any) -> Vec<(String, &dyn Any)>,
    pub build: fn(Vec<(String, AnyBox)>) -> JsonResult<AnyBox>,
}

#[derive(Clone, Copy)]
pub struct OptionalInfo {
    pub inner: fn() -> TypeInfo,
    pub get: fn(&dyn Any) -> Option<&dyn Any>,
    pub wrap: fn(Option<AnyBox>) -> JsonResult<AnyBox>,
}

/// Fieldless enumeration
pub struct EnumInfo {
    pub name: &'static str,
    /// External variant names, in declaration order
    pub variants: &'static [&'static str],
    /// Bit-flag enumerations are not convertible by the stock family
    pub flags: bool,
    pub to_index: fn(&dyn Any) -> Option<usize>,
    pub from_index: fn(usize) -> Option<AnyBox>,
}

/// Struct exposing named, readable and writable properties
pub struct ComponentInfo {
    pub name: &'static str,
    pub properties: &'static [PropertyInfo],
    /// Default-constructed instance
    pub construct: fn() -> AnyBox,
    /// Text representation used when no property is exposed
    pub to_text: fn(&dyn Any) -> String,
}

pub struct PropertyInfo {
    /// External member name
    pub name: &'static str,
    pub type_info: fn() -> TypeInfo,
    pub get: fn(&dyn Any) -> Option<PropertyValue<'_>>,
    pub set: fn(&mut dyn Any, AnyBox) -> JsonResult<()>,
}

/// Property value handed to exporters; remapped properties are converted on read
pub enum PropertyValue<'a> {
    Borrowed(&'a dyn Any),
    Owned(AnyBox),
}

impl PropertyValue<'_> {
    pub fn as_any(&self) -> &dyn Any {
        match self {
            PropertyValue::Borrowed(value) => *value,
            PropertyValue::Owned(value) => value.as_ref(),
        }
    }
}

/// Converters supplied by the type itself
#[derive(Clone, Copy)]
pub struct SelfDescribingInfo {
    pub import: fn(&ImportContext, &mut dyn JsonReader) -> JsonResult<AnyBox>,
    pub export: fn(&ExportContext, &dyn Any, &mut dyn JsonWrite) -> JsonResult<()>,
}

/// Native import capability
pub trait JsonImportable: Sized {
    fn import_json(context: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<Self>;
}

/// Native export capability
pub trait JsonExportable {
    fn export_json(&self, context: &ExportContext, writer: &mut dyn JsonWrite) -> JsonResult<()>;
}

impl TypeInfo {
    pub fn new<T: Any>(kind: TypeKind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind,
        }
    }

    pub fn primitive<T: Any>() -> Self {
        Self::new::<T>(TypeKind::Primitive)
    }

    pub fn opaque<T: Any>() -> Self {
        Self::new::<T>(TypeKind::Opaque)
    }

    /// Descriptor for a type implementing both native capabilities
    pub fn self_describing<T>() -> Self
    where
        T: JsonImportable + JsonExportable + Any + Send,
    {
        Self::new::<T>(TypeKind::SelfDescribing(SelfDescribingInfo {
            import: import_self::<T>,
            export: export_self::<T>,
        }))
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without module paths
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// True for `None`, JSON `null` values and `()`
    pub fn is_logical_null(&self, value: &dyn Any) -> bool {
        match self.kind {
            TypeKind::Optional(optional) => (optional.get)(value).is_none(),
            _ => value.downcast_ref::<Value>().is_some_and(Value::is_null) || value.is::<()>(),
        }
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind.label())
            .finish()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

impl TypeKind {
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Primitive => "primitive",
            TypeKind::Sequence(_) => "sequence",
            TypeKind::Map(_) => "map",
            TypeKind::Optional(_) => "optional",
            TypeKind::Enum(_) => "enum",
            TypeKind::Component(_) => "component",
            TypeKind::SelfDescribing(_) => "self-describing",
            TypeKind::Opaque => "opaque",
        }
    }
}

/// Strip module paths from every segment of a type name
pub fn short_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment = String::new();
    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            segment.push(c);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or_default());
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or_default());
    out
}

/// Recover a concrete value from an importer result
pub fn downcast_owned<T: Any>(value: AnyBox) -> JsonResult<T> {
    value
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| JsonError::import(format!("Expected a value of type {}.", type_name::<T>())))
}

/// Borrow a concrete value handed to an exporter
pub fn downcast_ref<T: Any>(value: &dyn Any) -> JsonResult<&T> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| JsonError::export(format!("Expected a value of type {}.", type_name::<T>())))
}

fn import_self<T>(context: &ImportContext, reader: &mut dyn JsonReader) -> JsonResult<AnyBox>
where
    T: JsonImportable + Any + Send,
{
    Ok(Box::new(T::import_json(context, reader)?))
}

fn export_self<T>(context: &ExportContext, value: &dyn Any, writer: &mut dyn JsonWrite) -> JsonResult<()>
where
    T: JsonExportable + Any,
{
    downcast_ref::<T>(value)?.export_json(context, writer)
}

macro_rules! impl_reflect_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::primitive::<$ty>()
                }
            }
        )*
    };
}

impl_reflect_primitive!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, Decimal, bool, String, (),
    DateTime<Utc>, NaiveDateTime, Value,
);

fn collection_items<C, T>(value: &dyn Any) -> Vec<&dyn Any>
where
    C: Any,
    T: Any,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    value
        .downcast_ref::<C>()
        .map(|collection| collection.into_iter().map(|item| item as &dyn Any).collect())
        .unwrap_or_default()
}

fn collect_items<C, T>(items: Vec<AnyBox>) -> JsonResult<AnyBox>
where
    C: FromIterator<T> + Any + Send,
    T: Any,
{
    let collection = items
        .into_iter()
        .map(downcast_owned::<T>)
        .collect::<JsonResult<C>>()?;
    Ok(Box::new(collection))
}

fn sequence_of<C, T>() -> TypeInfo
where
    C: FromIterator<T> + Any + Send,
    T: Reflect,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    TypeInfo::new::<C>(TypeKind::Sequence(SequenceInfo {
        element: T::type_info,
        items: collection_items::<C, T>,
        build: collect_items::<C, T>,
    }))
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_info() -> TypeInfo {
        sequence_of::<Vec<T>, T>()
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn type_info() -> TypeInfo {
        sequence_of::<VecDeque<T>, T>()
    }
}

impl<T: Reflect + Eq + Hash> Reflect for HashSet<T> {
    fn type_info() -> TypeInfo {
        sequence_of::<HashSet<T>, T>()
    }
}

impl<T: Reflect + Ord> Reflect for BTreeSet<T> {
    fn type_info() -> TypeInfo {
        sequence_of::<BTreeSet<T>, T>()
    }
}

fn map_entries<C, V>(value: &dyn Any) -> Vec<(String, &dyn Any)>
where
    C: Any,
    V: Any,
    for<'a> &'a C: IntoIterator<Item = (&'a String, &'a V)>,
{
    value
        .downcast_ref::<C>()
        .map(|map| {
            map.into_iter()
                .map(|(key, value)| (key.clone(), value as &dyn Any))
                .collect()
        })
        .unwrap_or_default()
}

fn collect_entries<C, V>(entries: Vec<(String, AnyBox)>) -> JsonResult<AnyBox>
where
    C: FromIterator<(String, V)> + Any + Send,
    V: Any,
{
    let map = entries
        .into_iter()
        .map(|(key, value)| Ok((key, downcast_owned::<V>(value)?)))
        .collect::<JsonResult<C>>()?;
    Ok(Box::new(map))
}

fn map_of<C, V>() -> TypeInfo
where
    C: FromIterator<(String, V)> + Any + Send,
    V: Reflect,
    for<'a> &'a C: IntoIterator<Item = (&'a String, &'a V)>,
{
    TypeInfo::new::<C>(TypeKind::Map(MapInfo {
        value: V::type_info,
        entries: map_entries::<C, V>,
        build: collect_entries::<C, V>,
    }))
}

impl<V: Reflect> Reflect for HashMap<String, V> {
    fn type_info() -> TypeInfo {
        map_of::<HashMap<String, V>, V>()
    }
}

impl<V: Reflect> Reflect for BTreeMap<String, V> {
    fn type_info() -> TypeInfo {
        map_of::<BTreeMap<String, V>, V>()
    }
}

fn option_get<T: Any>(value: &dyn Any) -> Option<&dyn Any> {
    value
        .downcast_ref::<Option<T>>()?
        .as_ref()
        .map(|inner| inner as &dyn Any)
}

fn option_wrap<T: Any + Send>(inner: Option<AnyBox>) -> JsonResult<AnyBox> {
    let value: Option<T> = inner.map(downcast_owned::<T>).transpose()?;
    Ok(Box::new(value))
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Option<T>>(TypeKind::Optional(OptionalInfo {
            inner: T::type_info,
            get: option_get::<T>,
            wrap: option_wrap::<T>,
        }))
    }
}
