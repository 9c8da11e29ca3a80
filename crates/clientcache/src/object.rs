use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use orka_core::Gvk;

/// Type information a value exposes to the client cache.
///
/// This is the seam to whatever scheme maps concrete values to type
/// identifiers; the cache itself never inspects the value beyond it.
pub trait TypedObject {
    /// Type identifier, or `None` when the value carries no type information.
    fn gvk(&self) -> Option<Gvk>;

    /// Whether the value is a list of items rather than a single object.
    fn is_list(&self) -> bool {
        false
    }

    /// Instance metadata; `None` for values without it (lists).
    fn object_meta(&self) -> Option<&ObjectMeta> {
        None
    }
}

impl<T: TypedObject + ?Sized> TypedObject for &T {
    fn gvk(&self) -> Option<Gvk> {
        (**self).gvk()
    }

    fn is_list(&self) -> bool {
        (**self).is_list()
    }

    fn object_meta(&self) -> Option<&ObjectMeta> {
        (**self).object_meta()
    }
}
