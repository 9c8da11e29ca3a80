use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::DynamicObject;
use orka_clientcache::TypedObject;
use orka_core::Gvk;

/// Borrowed view of a [`DynamicObject`] that the client cache can resolve.
///
/// Type information comes from the object's own `apiVersion`/`kind`; a value
/// whose data carries an `items` array is treated as a list.
#[derive(Debug, Clone, Copy)]
pub struct DynamicRef<'a>(pub &'a DynamicObject);

impl<'a> From<&'a DynamicObject> for DynamicRef<'a> {
    fn from(obj: &'a DynamicObject) -> Self {
        Self(obj)
    }
}

impl TypedObject for DynamicRef<'_> {
    fn gvk(&self) -> Option<Gvk> {
        let types = self.0.types.as_ref()?;
        if types.kind.is_empty() {
            return None;
        }
        let gvk = Gvk::from_api_version(&types.api_version, types.kind.clone());
        if gvk.version.is_empty() { None } else { Some(gvk) }
    }

    fn is_list(&self) -> bool {
        self.0.data.get("items").is_some_and(|items| items.is_array())
    }

    fn object_meta(&self) -> Option<&ObjectMeta> {
        if self.is_list() { None } else { Some(&self.0.metadata) }
    }
}
