//! Shorthands for building [`crate::error::EltError`] values.

/// Creates an [`crate::error::EltError`] from a kind, a static description and optionally a
/// dynamic detail.
#[macro_export]
macro_rules! elt_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::EltError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::EltError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Returns early with an [`crate::error::EltError`] built like [`elt_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return Err($crate::elt_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return Err($crate::elt_error!($kind, $desc, $detail))
    };
}
