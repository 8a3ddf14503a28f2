//! Callback handles for embedding event handlers in props.

use std::fmt;
use std::sync::Arc;

/// A cloneable event handler that can be embedded in props.
///
/// Multi-argument handlers take a tuple, e.g. `Callback<(String, String)>`
/// for `on_share(job_id, platform)`. Cloning is cheap: clones share the same
/// underlying function.
///
/// # Example
///
/// ```rust
/// use oxide_track::Callback;
///
/// struct JobCardProps {
///     job_id: String,
///     on_apply: Option<Callback<String>>,
/// }
///
/// let props = JobCardProps {
///     job_id: "42".into(),
///     on_apply: Some(Callback::new(|job_id: String| println!("apply {job_id}"))),
/// };
///
/// if let Some(on_apply) = &props.on_apply {
///     on_apply.call(props.job_id.clone());
/// }
/// ```
pub struct Callback<Args, Ret = ()>(Arc<dyn Fn(Args) -> Ret + Send + Sync>);

impl<Args, Ret> Clone for Callback<Args, Ret> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<Args, Ret> fmt::Debug for Callback<Args, Ret> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

impl<Args, Ret> Callback<Args, Ret> {
    pub fn new(f: impl Fn(Args) -> Ret + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invoke the handler.
    pub fn call(&self, args: Args) -> Ret {
        (self.0)(args)
    }

    /// Whether two handles share the same underlying function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
