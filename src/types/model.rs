use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A model identifier understood by the completion endpoint.
///
/// This can be one of the models chatterbox knows about, or any other string the
/// server accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier
    Custom(String),
}

/// Models commonly served by OpenAI-compatible hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// Llama 3.1 8B, the fast text model.
    #[serde(rename = "llama-3.1-8b-instant")]
    Llama31_8bInstant,

    /// Llama 3.3 70B.
    #[serde(rename = "llama-3.3-70b-versatile")]
    Llama33_70bVersatile,

    /// Llama 4 Scout, accepts images.
    #[serde(rename = "meta-llama/llama-4-scout-17b-16e-instruct")]
    Llama4Scout,

    /// Llama 4 Maverick, accepts images.
    #[serde(rename = "meta-llama/llama-4-maverick-17b-128e-instruct")]
    Llama4Maverick,

    /// Gemma 2 9B.
    #[serde(rename = "gemma2-9b-it")]
    Gemma2_9b,
}

impl KnownModel {
    /// Every known model, in display order.
    pub const ALL: [KnownModel; 5] = [
        KnownModel::Llama31_8bInstant,
        KnownModel::Llama33_70bVersatile,
        KnownModel::Llama4Scout,
        KnownModel::Llama4Maverick,
        KnownModel::Gemma2_9b,
    ];

    /// The identifier sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::Llama31_8bInstant => "llama-3.1-8b-instant",
            KnownModel::Llama33_70bVersatile => "llama-3.3-70b-versatile",
            KnownModel::Llama4Scout => "meta-llama/llama-4-scout-17b-16e-instruct",
            KnownModel::Llama4Maverick => "meta-llama/llama-4-maverick-17b-128e-instruct",
            KnownModel::Gemma2_9b => "gemma2-9b-it",
        }
    }

    /// Whether the model accepts image content parts.
    pub fn supports_vision(&self) -> bool {
        matches!(self, KnownModel::Llama4Scout | KnownModel::Llama4Maverick)
    }
}

impl Model {
    /// Whether the model is known to accept images.  Custom models are assumed not to.
    pub fn supports_vision(&self) -> bool {
        match self {
            Model::Known(known) => known.supports_vision(),
            Model::Custom(_) => false,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{known_model}"),
            Model::Custom(custom) => write!(f, "{custom}"),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(KnownModel::ALL
            .into_iter()
            .find(|known| known.as_str() == s)
            .map(Model::Known)
            .unwrap_or_else(|| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        match model.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::from(model.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_serialization() {
        let model = Model::Known(KnownModel::Llama31_8bInstant);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""llama-3.1-8b-instant""#);
    }

    #[test]
    fn custom_model_serialization() {
        let model = Model::Custom("mixtral-8x7b-32768".to_string());
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""mixtral-8x7b-32768""#);
    }

    #[test]
    fn model_deserialization() {
        let model: Model =
            serde_json::from_str(r#""meta-llama/llama-4-scout-17b-16e-instruct""#).unwrap();
        assert_eq!(model, Model::Known(KnownModel::Llama4Scout));

        let model: Model = serde_json::from_str(r#""my-finetune""#).unwrap();
        assert_eq!(model, Model::Custom("my-finetune".to_string()));
    }

    #[test]
    fn parse_prefers_known() {
        assert_eq!(
            Model::from("llama-3.3-70b-versatile"),
            Model::Known(KnownModel::Llama33_70bVersatile)
        );
        assert_eq!(
            Model::from(" something-else "),
            Model::Custom("something-else".to_string())
        );
    }

    #[test]
    fn vision_support() {
        assert!(Model::from(KnownModel::Llama4Scout).supports_vision());
        assert!(!Model::from(KnownModel::Llama31_8bInstant).supports_vision());
        assert!(!Model::Custom("whatever".to_string()).supports_vision());
    }
}
