//! Small reference strategies covering every kind and failure mode.

use std::collections::BTreeMap;

use form_core::{ArgValue, DataType, ParamValue, PuzzleKind, Signal};
use form_puzzle::{
    HardCondition, ParameterCalculator, PointSelector, PuzzleInputs, SignalModifier, StrategyArgs,
    StrategyClass, StrategyDescriptor, StrategyError, StrategyInstance, StrategyLibrary,
};

fn window(signal: &Signal, t_left: f64, t_right: f64) -> Result<Signal, StrategyError> {
    signal
        .get_fragment(t_left, t_right)
        .map_err(|_| StrategyError::OutOfSignal)
}

/// Coordinate of the largest sample in the window.
pub struct GlobalMax;

impl PointSelector for GlobalMax {
    fn run(&self, signal: &Signal, t_left: f64, t_right: f64) -> Result<Vec<f64>, StrategyError> {
        let fragment = window(signal, t_left, t_right)?;
        let (idx, _) = fragment
            .samples()
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (idx, value)| {
                if *value > best.1 {
                    (idx, *value)
                } else {
                    best
                }
            });
        Ok(vec![fragment.time_of(idx)])
    }
}

/// Every strict local maximum in the window.
pub struct LocalMaxima;

impl PointSelector for LocalMaxima {
    fn run(&self, signal: &Signal, t_left: f64, t_right: f64) -> Result<Vec<f64>, StrategyError> {
        let fragment = window(signal, t_left, t_right)?;
        let samples = fragment.samples();
        Ok((1..samples.len().saturating_sub(1))
            .filter(|&i| samples[i] > samples[i - 1] && samples[i] >= samples[i + 1])
            .map(|i| fragment.time_of(i))
            .collect())
    }
}

/// Returns the configured coordinates verbatim.
pub struct FixedPoints {
    points: Vec<f64>,
}

impl PointSelector for FixedPoints {
    fn run(&self, _signal: &Signal, _t_left: f64, _t_right: f64) -> Result<Vec<f64>, StrategyError> {
        Ok(self.points.clone())
    }
}

/// Opts out on windows narrower than `min_width` seconds.
pub struct NeedsWideWindow {
    min_width: f64,
}

impl PointSelector for NeedsWideWindow {
    fn run(&self, _signal: &Signal, t_left: f64, t_right: f64) -> Result<Vec<f64>, StrategyError> {
        if t_right - t_left < self.min_width {
            return Err(StrategyError::OutOfSignal);
        }
        Ok(vec![(t_left + t_right) / 2.0])
    }
}

/// Always fails.
pub struct Broken;

impl PointSelector for Broken {
    fn run(&self, _signal: &Signal, _t_left: f64, _t_right: f64) -> Result<Vec<f64>, StrategyError> {
        Err(StrategyError::failed("selector is broken"))
    }
}

/// Drops the last sample, violating the modifier contract.
pub struct Truncate;

impl SignalModifier for Truncate {
    fn run(&self, signal: &Signal, _t_left: f64, _t_right: f64) -> Result<Signal, StrategyError> {
        let samples = signal.samples();
        Ok(signal.with_samples(samples[..samples.len().saturating_sub(1)].to_vec()))
    }
}

/// Multiplies every sample by `factor`.
pub struct Scale {
    factor: f64,
}

impl SignalModifier for Scale {
    fn run(&self, signal: &Signal, _t_left: f64, _t_right: f64) -> Result<Signal, StrategyError> {
        Ok(signal.with_samples(signal.samples().iter().map(|v| v * self.factor).collect()))
    }
}

/// Signal value at the bound point.
pub struct Amplitude;

impl ParameterCalculator for Amplitude {
    fn run(
        &self,
        signal: &Signal,
        inputs: &PuzzleInputs,
    ) -> Result<BTreeMap<String, ParamValue>, StrategyError> {
        let t = inputs.point("point")?;
        let value = signal.value_at(t).ok_or(StrategyError::OutOfSignal)?;
        Ok(BTreeMap::from([("amplitude".to_string(), ParamValue::Float(value))]))
    }
}

/// Distance in seconds between two bound points.
pub struct Duration;

impl ParameterCalculator for Duration {
    fn run(
        &self,
        _signal: &Signal,
        inputs: &PuzzleInputs,
    ) -> Result<BTreeMap<String, ParamValue>, StrategyError> {
        let width = inputs.point("end")? - inputs.point("start")?;
        Ok(BTreeMap::from([("duration".to_string(), ParamValue::Float(width))]))
    }
}

/// Sum of two bound parameters.
pub struct Sum;

impl ParameterCalculator for Sum {
    fn run(
        &self,
        _signal: &Signal,
        inputs: &PuzzleInputs,
    ) -> Result<BTreeMap<String, ParamValue>, StrategyError> {
        let total = inputs.number("x")? + inputs.number("y")?;
        Ok(BTreeMap::from([("sum".to_string(), ParamValue::Float(total))]))
    }
}

/// Copies a parameter to its output.
pub struct Relay;

impl ParameterCalculator for Relay {
    fn run(
        &self,
        _signal: &Signal,
        inputs: &PuzzleInputs,
    ) -> Result<BTreeMap<String, ParamValue>, StrategyError> {
        Ok(BTreeMap::from([(
            "output".to_string(),
            ParamValue::Float(inputs.number("input")?),
        )]))
    }
}

/// Returns an output the class never declared.
pub struct Rogue;

impl ParameterCalculator for Rogue {
    fn run(
        &self,
        _signal: &Signal,
        _inputs: &PuzzleInputs,
    ) -> Result<BTreeMap<String, ParamValue>, StrategyError> {
        Ok(BTreeMap::from([("surprise".to_string(), ParamValue::Float(1.0))]))
    }
}

/// `value > threshold`.
pub struct GreaterThan {
    threshold: f64,
}

impl HardCondition for GreaterThan {
    fn run(&self, inputs: &PuzzleInputs) -> Result<bool, StrategyError> {
        Ok(inputs.number("value")? > self.threshold)
    }
}

fn class<F>(descriptor: StrategyDescriptor, factory: F) -> StrategyClass
where
    F: Fn(&StrategyArgs) -> Result<StrategyInstance, StrategyError> + Send + Sync + 'static,
{
    StrategyClass::new(descriptor, factory)
}

/// Every reference strategy.
pub fn reference_classes() -> Vec<StrategyClass> {
    vec![
        class(StrategyDescriptor::new("GlobalMax", PuzzleKind::Ps), |_| {
            Ok(StrategyInstance::Ps(Box::new(GlobalMax)))
        }),
        class(StrategyDescriptor::new("LocalMaxima", PuzzleKind::Ps), |_| {
            Ok(StrategyInstance::Ps(Box::new(LocalMaxima)))
        }),
        class(
            StrategyDescriptor::new("FixedPoints", PuzzleKind::Ps).argument(
                "points",
                DataType::List(Box::new(DataType::Float)),
                ArgValue::List(Vec::new()),
            ),
            |args| {
                Ok(StrategyInstance::Ps(Box::new(FixedPoints {
                    points: args.float_list("points")?,
                })))
            },
        ),
        class(
            StrategyDescriptor::new("NeedsWideWindow", PuzzleKind::Ps).argument(
                "min_width",
                DataType::Float,
                ArgValue::Float(1.0),
            ),
            |args| {
                Ok(StrategyInstance::Ps(Box::new(NeedsWideWindow {
                    min_width: args.float("min_width")?,
                })))
            },
        ),
        class(StrategyDescriptor::new("Broken", PuzzleKind::Ps), |_| {
            Ok(StrategyInstance::Ps(Box::new(Broken)))
        }),
        class(StrategyDescriptor::new("Truncate", PuzzleKind::Sm), |_| {
            Ok(StrategyInstance::Sm(Box::new(Truncate)))
        }),
        class(
            StrategyDescriptor::new("Scale", PuzzleKind::Sm).argument(
                "factor",
                DataType::Float,
                ArgValue::Float(1.0),
            ),
            |args| {
                Ok(StrategyInstance::Sm(Box::new(Scale {
                    factor: args.float("factor")?,
                })))
            },
        ),
        class(
            StrategyDescriptor::new("Amplitude", PuzzleKind::Pc)
                .input_point("point")
                .output("amplitude", DataType::Float, "signal value at the point"),
            |_| Ok(StrategyInstance::Pc(Box::new(Amplitude))),
        ),
        class(
            StrategyDescriptor::new("Duration", PuzzleKind::Pc)
                .input_point("start")
                .input_point("end")
                .output("duration", DataType::Float, "seconds between the points"),
            |_| Ok(StrategyInstance::Pc(Box::new(Duration))),
        ),
        class(
            StrategyDescriptor::new("Sum", PuzzleKind::Pc)
                .input_param("x")
                .input_param("y")
                .output("sum", DataType::Float, "x + y"),
            |_| Ok(StrategyInstance::Pc(Box::new(Sum))),
        ),
        class(
            StrategyDescriptor::new("Relay", PuzzleKind::Pc)
                .input_param("input")
                .output("output", DataType::Float, "copy of the input"),
            |_| Ok(StrategyInstance::Pc(Box::new(Relay))),
        ),
        class(
            StrategyDescriptor::new("Rogue", PuzzleKind::Pc).output(
                "declared",
                DataType::Float,
                "never produced",
            ),
            |_| Ok(StrategyInstance::Pc(Box::new(Rogue))),
        ),
        class(
            StrategyDescriptor::new("GreaterThan", PuzzleKind::Hc)
                .input_param("value")
                .argument("threshold", DataType::Float, ArgValue::Float(0.0)),
            |args| {
                Ok(StrategyInstance::Hc(Box::new(GreaterThan {
                    threshold: args.float("threshold")?,
                })))
            },
        ),
    ]
}

/// Library linking every reference strategy.
pub fn reference_library() -> StrategyLibrary {
    let mut library = StrategyLibrary::new();
    for class in reference_classes() {
        library
            .register(class)
            .expect("reference class names are unique");
    }
    library
}
