use super::{CodecError, Marshaller, as_object, required, required_i64};
use crate::visualization::Visualization;
use serde_json::{Map, Value};

const TIME_SCALE: &str = "TimeScale";
const CYCLE_RATE: &str = "CycleRate";
const SCHEDULER: &str = "Scheduler";
const LIGHTS: &str = "Lights";

pub fn visualization_to_json(visualization: &Visualization) -> Value {
    let lights: Map<String, Value> = visualization
        .mapping()
        .iter()
        .map(|(light, shown)| {
            let shown = shown.clone().map(Value::String).unwrap_or(Value::Null);
            (light.clone(), shown)
        })
        .collect();
    let mut object = Map::new();
    object.insert(TIME_SCALE.into(), visualization.time_scale().into());
    object.insert(CYCLE_RATE.into(), visualization.cycle_rate().into());
    if let Some(scheduler) = visualization.scheduler() {
        object.insert(SCHEDULER.into(), scheduler.into());
    }
    object.insert(LIGHTS.into(), Value::Object(lights));
    Value::Object(object)
}

pub fn visualization_from_json(value: &Value) -> Result<Visualization, CodecError> {
    let object = as_object(value, "object for visualization settings")?;
    let mut visualization = Visualization::new();
    visualization
        .set_time_scale(required_i64(object, TIME_SCALE)?)
        .map_err(|err| CodecError::invalid(TIME_SCALE, err.to_string()))?;
    visualization
        .set_cycle_rate(required_i64(object, CYCLE_RATE)?)
        .map_err(|err| CodecError::invalid(CYCLE_RATE, err.to_string()))?;

    let scheduler = match object.get(SCHEDULER) {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => return Err(CodecError::invalid(SCHEDULER, "expected a string")),
    };
    visualization.set_scheduler(scheduler);

    let lights = required(object, LIGHTS)?
        .as_object()
        .ok_or_else(|| CodecError::invalid(LIGHTS, "expected an object"))?;
    for (light, shown) in lights {
        let shown = match shown {
            Value::Null => None,
            Value::String(name) => Some(name.clone()),
            other => {
                return Err(CodecError::invalid(
                    LIGHTS,
                    format!("light '{light}' maps to {other}"),
                ));
            }
        };
        visualization.set(light.clone(), shown);
    }
    Ok(visualization)
}

/// Persists [`Visualization`] settings through a [`Manager`](crate::Manager).
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualizationCodec;

impl Marshaller<Visualization> for VisualizationCodec {
    fn marshal(&self, value: &Visualization) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(&visualization_to_json(value))?)
    }

    fn unmarshal(&self, text: &str) -> Result<Visualization, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        visualization_from_json(&value)
    }
}
