//! Message contract between the host page and the render worker.
//!
//! Inbound messages are a tagged union on `type`. Every payload field is
//! optional: an absent field leaves the engine's current value untouched.
//! The render target itself is transferred out of band and never appears in
//! the JSON payload.

use flows::{Centroid, PathMode, RawNode};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficFilter {
    #[default]
    All,
    Hidden,
    General,
}

impl TrafficFilter {
    /// Value of the shader-side filter uniform.
    pub fn uniform(self) -> u32 {
        match self {
            TrafficFilter::All => 0,
            TrafficFilter::Hidden => 1,
            TrafficFilter::General => 2,
        }
    }
}

/// Camera fields the host may update independently.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPatch {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub zoom: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub device_pixel_ratio: Option<f64>,
}

/// Partial settings delta.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub density: Option<f64>,
    pub opacity: Option<f64>,
    pub speed: Option<f64>,
    pub traffic_type: Option<TrafficFilter>,
    pub path_mode: Option<PathMode>,
    pub hidden_service_probability: Option<f64>,
    pub path_width: Option<f64>,
    pub particle_count: Option<f64>,
    pub size: Option<f64>,
    pub scale_by_zoom: Option<bool>,
    pub scale_by_bandwidth: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }
}

/// Host → worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Start the engine. The canvas travels alongside as a transferable.
    #[serde(rename_all = "camelCase")]
    Init {
        #[serde(default)]
        device_pixel_ratio: Option<f64>,
        #[serde(default)]
        centroids: Option<Vec<Centroid>>,
    },
    /// Replace the raw node set.
    UpdateNodes {
        #[serde(default)]
        nodes: Option<Vec<RawNode>>,
    },
    #[serde(rename_all = "camelCase")]
    UpdateViewState {
        #[serde(default)]
        view_state: Option<ViewPatch>,
    },
    #[serde(rename_all = "camelCase")]
    Resize {
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
        #[serde(default)]
        device_pixel_ratio: Option<f64>,
    },
    UpdateSettings {
        #[serde(default)]
        settings: Option<SettingsPatch>,
    },
    /// Stop the loop and release GPU resources.
    Shutdown,
}

const COMMAND_TYPES: [&str; 6] = [
    "init",
    "updateNodes",
    "updateViewState",
    "resize",
    "updateSettings",
    "shutdown",
];

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Init { .. } => "init",
            Command::UpdateNodes { .. } => "updateNodes",
            Command::UpdateViewState { .. } => "updateViewState",
            Command::Resize { .. } => "resize",
            Command::UpdateSettings { .. } => "updateSettings",
            Command::Shutdown => "shutdown",
        }
    }

    pub fn decode(json: &str) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, DecodeError> {
        let ty = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(DecodeError::MissingType)?;
        let Some(kind) = COMMAND_TYPES.iter().copied().find(|t| *t == ty) else {
            return Err(DecodeError::UnknownType(ty.to_string()));
        };
        match serde_json::from_value::<Command>(value.clone()) {
            Ok(command) => Ok(command),
            Err(source) => {
                let fields = invalid_fields(kind, &value);
                if fields.is_empty() {
                    Err(DecodeError::Json(source))
                } else {
                    Err(DecodeError::InvalidFields {
                        kind,
                        fields,
                        source,
                    })
                }
            }
        }
    }
}

/// Payload objects whose members are reported individually.
const NESTED_PAYLOADS: [&str; 2] = ["settings", "viewState"];

fn accepts(kind: &str, field: &str, value: &serde_json::Value) -> bool {
    let mut single = serde_json::Map::new();
    single.insert("type".to_string(), kind.into());
    single.insert(field.to_string(), value.clone());
    serde_json::from_value::<Command>(serde_json::Value::Object(single)).is_ok()
}

/// Names every field of a rejected `kind` message that fails on its own,
/// as `field` or `payload.member`.
fn invalid_fields(kind: &str, value: &serde_json::Value) -> Vec<String> {
    let Some(object) = value.as_object() else {
        return Vec::new();
    };
    let mut fields = Vec::new();
    for (key, field) in object.iter().filter(|(key, _)| *key != "type") {
        if accepts(kind, key, field) {
            continue;
        }
        let members: Vec<String> = match field.as_object() {
            Some(members) if NESTED_PAYLOADS.contains(&key.as_str()) => members
                .iter()
                .filter(|(member, v)| {
                    let single = serde_json::Value::Object(
                        [((*member).clone(), (*v).clone())].into_iter().collect(),
                    );
                    !accepts(kind, key, &single)
                })
                .map(|(member, _)| format!("{key}.{member}"))
                .collect(),
            _ => Vec::new(),
        };
        if members.is_empty() {
            fields.push(key.clone());
        } else {
            fields.extend(members);
        }
    }
    fields
}

/// Worker → host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerMessage {
    /// Raw node indices referenced by the currently displayed routes.
    VisibleNodes { indices: Vec<u32> },
}

impl WorkerMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, SettingsPatch, TrafficFilter, ViewPatch, WorkerMessage};
    use crate::error::DecodeError;
    use flows::{PathMode, RawNode};
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_init_with_centroids() {
        let cmd = Command::decode(
            r#"{"type":"init","devicePixelRatio":2,"canvas":{},"centroids":[{"code":"DE","lng":10.4,"lat":51.1}]}"#,
        )
        .expect("decode");
        match cmd {
            Command::Init {
                device_pixel_ratio,
                centroids,
            } => {
                assert_eq!(device_pixel_ratio, Some(2.0));
                assert_eq!(centroids.expect("centroids")[0].code, "DE");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decodes_partial_settings() {
        let cmd = Command::decode(
            r#"{"type":"updateSettings","settings":{"density":0.5,"pathMode":"country","trafficType":"hidden"}}"#,
        )
        .expect("decode");
        assert_eq!(
            cmd,
            Command::UpdateSettings {
                settings: Some(SettingsPatch {
                    density: Some(0.5),
                    path_mode: Some(PathMode::Country),
                    traffic_type: Some(TrafficFilter::Hidden),
                    ..SettingsPatch::default()
                }),
            }
        );
    }

    #[test]
    fn decodes_partial_view_state() {
        let cmd = Command::decode(r#"{"type":"updateViewState","viewState":{"zoom":3.5}}"#)
            .expect("decode");
        assert_eq!(
            cmd,
            Command::UpdateViewState {
                view_state: Some(ViewPatch {
                    zoom: Some(3.5),
                    ..ViewPatch::default()
                }),
            }
        );
    }

    #[test]
    fn absent_payloads_decode_as_none() {
        assert_eq!(
            Command::decode(r#"{"type":"updateNodes"}"#).expect("decode"),
            Command::UpdateNodes { nodes: None }
        );
        assert_eq!(
            Command::decode(r#"{"type":"resize","width":800}"#).expect("decode"),
            Command::Resize {
                width: Some(800.0),
                height: None,
                device_pixel_ratio: None,
            }
        );
        assert_eq!(
            Command::decode(r#"{"type":"shutdown"}"#).expect("decode"),
            Command::Shutdown
        );
    }

    #[test]
    fn decodes_nodes() {
        let cmd = Command::decode(
            r#"{"type":"updateNodes","nodes":[{"lng":1,"lat":2,"hsdir":true,"bandwidth":3}]}"#,
        )
        .expect("decode");
        assert_eq!(
            cmd,
            Command::UpdateNodes {
                nodes: Some(vec![RawNode::new(1.0, 2.0, true, 3.0)]),
            }
        );
    }

    #[test]
    fn rejects_unknown_and_untyped_messages() {
        assert!(matches!(
            Command::decode(r#"{"type":"explode"}"#),
            Err(DecodeError::UnknownType(t)) if t == "explode"
        ));
        assert!(matches!(
            Command::decode(r#"{"density":1}"#),
            Err(DecodeError::MissingType)
        ));
        assert!(matches!(
            Command::decode("{\"type\":"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn mistyped_fields_are_named() {
        let err = Command::decode(
            r#"{"type":"updateSettings","settings":{"density":"lots","opacity":0.5,"size":[1]}}"#,
        )
        .expect_err("mistyped settings");
        match &err {
            DecodeError::InvalidFields { kind, fields, .. } => {
                assert_eq!(*kind, "updateSettings");
                assert_eq!(fields, &vec!["settings.density".to_string(), "settings.size".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("settings.density"));

        let err = Command::decode(r#"{"type":"resize","width":"wide","height":600}"#)
            .expect_err("mistyped width");
        assert!(matches!(
            err,
            DecodeError::InvalidFields { fields, .. } if fields == vec!["width".to_string()]
        ));
    }

    #[test]
    fn command_kind_matches_wire_tag() {
        let cmd = Command::Resize {
            width: None,
            height: None,
            device_pixel_ratio: None,
        };
        let json = serde_json::to_value(&cmd).expect("encode");
        assert_eq!(json["type"], cmd.kind());
    }

    #[test]
    fn encodes_visible_nodes() {
        let msg = WorkerMessage::VisibleNodes {
            indices: vec![0, 4, 9],
        };
        assert_eq!(
            msg.encode().expect("encode"),
            r#"{"type":"visibleNodes","indices":[0,4,9]}"#
        );
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(SettingsPatch::default().is_empty());
        assert!(
            !SettingsPatch {
                size: Some(2.0),
                ..SettingsPatch::default()
            }
            .is_empty()
        );
    }
}
