use serde::{Deserialize, Serialize};

/// Waveform type enumeration for dynamic waveform selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    SawUp,
    SawDown,
    Square,
    Pulse,
    Noise,
}

impl Waveform {
    pub const ALL: [Waveform; 7] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::SawUp,
        Waveform::SawDown,
        Waveform::Square,
        Waveform::Pulse,
        Waveform::Noise,
    ];

    /// True for shapes rendered from the table banks (everything but noise).
    pub fn is_table_based(self) -> bool {
        !matches!(self, Waveform::Noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Waveform::SawUp).unwrap();
        assert_eq!(json, "\"saw_up\"");
        let shape: Waveform = serde_json::from_str("\"pulse\"").unwrap();
        assert_eq!(shape, Waveform::Pulse);
    }

    #[test]
    fn test_table_based() {
        assert!(Waveform::Square.is_table_based());
        assert!(!Waveform::Noise.is_table_based());
        assert_eq!(Waveform::ALL.iter().filter(|w| w.is_table_based()).count(), 6);
    }
}
