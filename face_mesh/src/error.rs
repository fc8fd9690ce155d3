use thiserror::Error;

use crate::params::FlagValue;

#[derive(Error, Debug)]
pub enum ConfigureError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0} is not a tunable or valid environment flag.")]
    UnknownFlag(String),

    #[error("{flag} value is expected to be in the range [{}], while {value} is found.", join(.allowed))]
    InvalidFlagValue {
        flag: String,
        value: String,
        allowed: &'static [FlagValue],
    },

    #[error("{0} backend is not registered.")]
    BackendNotRegistered(String),

    #[error("{backend} backend failed to initialize: {source}")]
    BackendInit {
        backend: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("face {face} has no keypoint {index} required by contour {contour}")]
    MissingKeypoint {
        face: usize,
        contour: String,
        index: usize,
    },
}

fn join(values: &[FlagValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
