//! The per-signal state cell and its operand evaluation rules.

use serde::{Deserialize, Serialize};

/// Totally ordered event priority. `None` disables a signal entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    None,
    Low,
    High,
    Panic,
}

/// The evaluation rule a signal applies on update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operand {
    /// Leaving `[lo, hi]`.
    OnExit,
    /// Entering `(lo, hi)`.
    OnEntrance,
    /// Either exit or entrance.
    OnBoth,
    /// Tracked, never fires.
    Monitoring,
    /// Symmetric band-cross; no re-fire until the opposite band re-enters.
    OnHysteresis,
    /// Fires on any change.
    OnChange,
    /// Fires once `|new - prev| >= hi`; otherwise reverts the stored value.
    OnDeltaChange,
}

/// A dynamically typed wire value: integer, real, string, or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Real(f64),
    Str(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            Value::Str(_) => None,
        }
    }
}

/// Which side of a hysteresis band a signal last fired from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum HysteresisSide {
    Inside,
    Above,
    Below,
}

/// An atomic I/O signal: current value, thresholds, operand, and priority.
///
/// Invariant: `lo <= hi`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub value: Option<Value>,
    pub lo: f64,
    pub hi: f64,
    pub operand: Operand,
    pub priority: Priority,
    /// Included in the next emitted record only, then dropped.
    pub event_only: bool,
    #[serde(skip, default)]
    hysteresis_side: Option<HysteresisSide>,
}

impl Default for Signal {
    fn default() -> Self {
        Self {
            value: None,
            lo: 0.0,
            hi: 1.0,
            operand: Operand::Monitoring,
            priority: Priority::None,
            event_only: false,
            hysteresis_side: None,
        }
    }
}

impl Signal {
    pub fn new(operand: Operand, priority: Priority) -> Self {
        Self { operand, priority, ..Default::default() }
    }

    pub fn with_band(mut self, lo: f64, hi: f64) -> Self {
        debug_assert!(lo <= hi, "Signal invariant lo <= hi violated");
        self.lo = lo;
        self.hi = hi;
        self
    }

    pub fn event_only(mut self, event_only: bool) -> Self {
        self.event_only = event_only;
        self
    }

    /// Apply an update, returning `true` if the signal fires.
    ///
    /// On `ON_DELTA_CHANGE` a non-firing update reverts the stored value to
    /// the pre-update baseline so later updates accumulate against it.
    pub fn update(&mut self, new_value: Value) -> bool {
        if self.priority == Priority::None {
            self.value = Some(new_value);
            return false;
        }

        let prev = self.value.clone();
        if let Some(p) = &prev {
            if *p == new_value {
                return false;
            }
        }

        self.value = Some(new_value.clone());

        match self.operand {
            Operand::Monitoring => false,
            Operand::OnChange => true,
            _ => self.evaluate_numeric(prev.as_ref(), &new_value),
        }
    }

    fn evaluate_numeric(&mut self, prev: Option<&Value>, new_value: &Value) -> bool {
        let (prev, new) = match (prev.and_then(Value::as_f64), new_value.as_f64()) {
            (Some(p), Some(n)) => (p, n),
            // first update, or non-numeric value: thresholds cannot apply
            _ => return false,
        };
        let (lo, hi) = (self.lo, self.hi);

        match self.operand {
            Operand::OnExit => {
                let was_inside = (lo..=hi).contains(&prev);
                let now_outside = new < lo || new > hi;
                was_inside && now_outside
            }
            Operand::OnEntrance => {
                let now_inside = new > lo && new < hi;
                let was_outside = prev <= lo || prev >= hi;
                now_inside && was_outside
            }
            Operand::OnBoth => {
                let was_inside = (lo..=hi).contains(&prev);
                let now_outside = new < lo || new > hi;
                let exit = was_inside && now_outside;
                let now_inside = new > lo && new < hi;
                let was_outside = prev <= lo || prev >= hi;
                let entrance = now_inside && was_outside;
                exit || entrance
            }
            Operand::OnHysteresis => self.evaluate_hysteresis(new),
            Operand::OnDeltaChange => {
                if (prev - new).abs() >= hi {
                    true
                } else {
                    // revert: later updates accumulate against the original baseline
                    self.value = Some(Value::Real(prev));
                    false
                }
            }
            Operand::Monitoring | Operand::OnChange => unreachable!("handled above"),
        }
    }

    fn evaluate_hysteresis(&mut self, new: f64) -> bool {
        let (lo, hi) = (self.lo, self.hi);
        let side = if new < lo {
            HysteresisSide::Below
        } else if new > hi {
            HysteresisSide::Above
        } else {
            HysteresisSide::Inside
        };

        let fires = match (self.hysteresis_side, side) {
            (Some(HysteresisSide::Inside) | None, HysteresisSide::Above)
            | (Some(HysteresisSide::Inside) | None, HysteresisSide::Below) => true,
            (Some(HysteresisSide::Above), HysteresisSide::Below) => true,
            (Some(HysteresisSide::Below), HysteresisSide::Above) => true,
            _ => false,
        };
        self.hysteresis_side = Some(side);
        fires
    }
}
