//! Serialization of outbound wire messages: per-frame telemetry and the
//! one-time registration descriptor

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Map, Value};

use crate::frame::{transpose, Frame};
use crate::Error;

/// Wire name of a channel: 1-indexed `Ch1`, `Ch2`, ...
pub fn channel_key(index: usize) -> String {
    format!("Ch{}", index + 1)
}

struct FrameMessage {
    /// Channel-major values, temporal order within each channel
    channels: Vec<Vec<f32>>,
    /// Last trigger time in ms since the epoch, absent when the bridge
    /// runs without control
    trigger_ms: Option<i64>,
}

impl Serialize for FrameMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (c, values) in self.channels.iter().enumerate() {
            map.serialize_entry(&channel_key(c), values)?;
        }
        if let Some(ms) = self.trigger_ms {
            map.serialize_entry("last_trigger_on_client", &ms)?;
        }
        map.end()
    }
}

/// Encode one completed frame as a flat JSON object of channel-major
/// value arrays, `Ch1` through `ChK` in channel order. When `trigger_ms`
/// is `Some` the shared trigger timestamp is appended under
/// `last_trigger_on_client`, sentinel included. Identical inputs yield
/// byte-identical output.
pub fn frame(frame: &Frame, trigger_ms: Option<i64>) -> Result<Vec<u8>, Error> {
    let msg = FrameMessage {
        channels: transpose(&frame.ticks),
        trigger_ms,
    };
    serde_json::to_vec(&msg).map_err(Error::Encode)
}

/// Build the registration descriptor sent once at connect time: the
/// static template's fields, then the derived reporting schema.
///
/// Every channel is declared as a `float` series with a `static` visual
/// hint. With `control` set, the schema also declares the synthetic
/// `last_trigger_on_client` integer so it matches what [`frame`] emits.
/// The upstream source's self-description goes in verbatim under
/// `lsl_descriptor`.
pub fn descriptor(
    template: &Value,
    channels: usize,
    source_info: &str,
    control: bool,
) -> Result<Vec<u8>, Error> {
    let mut doc = match template {
        Value::Object(fields) => fields.clone(),
        _ => {
            return Err(Error::Config(
                "descriptor template must be a JSON object".into(),
            ))
        }
    };

    let mut report = Map::new();
    let mut visual = Map::new();
    for c in 0..channels {
        report.insert(channel_key(c), json!("float"));
        visual.insert(channel_key(c), json!("static"));
    }
    if control {
        report.insert("last_trigger_on_client".to_string(), json!("int"));
    }

    doc.insert("data_to_report".to_string(), Value::Object(report));
    doc.insert("lsl_descriptor".to_string(), json!(source_info));
    doc.insert("visual_report".to_string(), Value::Object(visual));

    serde_json::to_vec(&Value::Object(doc)).map_err(Error::Encode)
}
