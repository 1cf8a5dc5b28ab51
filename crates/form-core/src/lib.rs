#![deny(missing_docs)]
#![doc = "Core data model, error taxonomy and bookkeeping types for the form engine."]

pub mod errors;
pub mod exemplar;
pub mod hash;
pub mod ids;
pub mod model;
pub mod pool;
pub mod rng;
pub mod signal;
pub mod value;

pub use errors::{codes, ErrorInfo, FormError};
pub use exemplar::{Exemplar, PlacedPoint};
pub use hash::stable_hash_string;
pub use ids::{ClassId, DeclId, ExemplarId, FormId, ParameterId, PointId, PuzzleId, TrackId};
pub use model::{
    ArgumentValue, BaseClass, Boundary, Declaration, Form, ParamBinding, Parameter, Point,
    PointBinding, Puzzle, PuzzleKind, Step, Track,
};
pub use pool::{pool_order, ExemplarsPool};
pub use rng::{stream_seed, RngHandle, Stream};
pub use signal::Signal;
pub use value::{ArgValue, DataType, ParamValue};
