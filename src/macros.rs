pub use enclose::*;

/// Build a [`crate::Declaration`] from a getter closure, cloning the
/// listed captures:
///
/// ```ignore
/// registry.declare("greeting", async_computed!((client) ctx, ev => {
///     ctx.locale.get(ev);
///     let client = client.clone();
///     Compute::deferred(async move { client.fetch_greeting().await })
/// }))?;
/// ```
#[macro_export]
macro_rules! async_computed {
    (( $($d_tt:tt)* ) $ctx:ident, $ev:ident => $($b:tt)*) => {
        $crate::Declaration::getter($crate::macros::enclose!(($( $d_tt )*) move |$ctx, $ev: &$crate::Evaluation| { $($b)* }))
    };
    ($ctx:ident, $ev:ident => $($b:tt)*) => {
        $crate::Declaration::getter(move |$ctx, $ev: &$crate::Evaluation| { $($b)* })
    };
}

/// Run writes inside a batch.
#[macro_export]
macro_rules! batch {
    ($($b:tt)*) => {
        $crate::batch(|| { $($b)* })
    };
}
