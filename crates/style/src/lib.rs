pub mod dimension;
pub mod font;
pub mod key;
pub mod parsers;
pub mod resolver;
pub mod stylesheet;
pub mod text;
pub mod value;

pub use dimension::{Dimension, Insets};
pub use font::FontSpec;
pub use key::StyleKey;
pub use parsers::StyleParseError;
pub use resolver::{ResolvedStyle, StyleDiagnostic, StyleResolver};
pub use stylesheet::{NamedStyles, StyleChangeSet, StyleError, StyleSheet};
pub use text::{LayoutMode, TextAlign, VerticalAlign};
pub use value::{StyleValue, ValueType};
