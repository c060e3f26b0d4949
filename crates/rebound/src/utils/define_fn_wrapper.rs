// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Generates a cloneable, thread-safe wrapper around a user-provided closure.
///
/// The generated type stores the closure in an `Arc<dyn Fn ...>` and provides
/// `new`, `call` and `Debug`. Used for callbacks and injectable functions that
/// must be shared between clones of the owning type.
///
/// # Syntax
///
/// ```rust,ignore
/// define_fn_wrapper!(pub(crate) NextF64(Fn() -> f64));
/// define_fn_wrapper!(pub(crate) OnEvent(Fn(event: &Event, args: EventArgs<'_>)));
/// ```
macro_rules! define_fn_wrapper {
    ($(#[$meta:meta])* $vis:vis $name:ident(Fn($($param_name:ident: $param_ty:ty),*) -> $return_ty:ty)) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis struct $name(std::sync::Arc<dyn Fn($($param_ty),*) -> $return_ty + Send + Sync>);

        impl $name {
            pub(crate) fn new<F>(f: F) -> Self
            where
                F: Fn($($param_ty),*) -> $return_ty + Send + Sync + 'static,
            {
                Self(std::sync::Arc::new(f))
            }

            pub(crate) fn call(&self, $($param_name: $param_ty),*) -> $return_ty {
                (self.0)($($param_name),*)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish()
            }
        }
    };

    // Without a return type the closure returns unit.
    ($(#[$meta:meta])* $vis:vis $name:ident(Fn($($param_name:ident: $param_ty:ty),*))) => {
        $crate::utils::define_fn_wrapper!($(#[$meta])* $vis $name(Fn($($param_name: $param_ty),*) -> ()));
    };
}

pub(crate) use define_fn_wrapper;
