pub mod color;
pub mod geometry;
pub mod ids;
pub mod lifecycle;
pub mod units;
pub mod value;

pub use color::Color;
pub use geometry::{BoxConstraints, Rect, Size};
pub use ids::{ElementName, InstanceId, QueryName};
pub use lifecycle::ProcessingLevel;
pub use units::Pt;
pub use value::Value;
