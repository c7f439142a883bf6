use serde::{Deserialize, Serialize};

/// Dimension unit used by the source store. All feed dimensions are
/// normalised to millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionUnit {
    Mm,
    Cm,
    M,
    In,
    Yd,
}

impl DimensionUnit {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "mm" => Some(DimensionUnit::Mm),
            "cm" => Some(DimensionUnit::Cm),
            "m" => Some(DimensionUnit::M),
            "in" => Some(DimensionUnit::In),
            "yd" => Some(DimensionUnit::Yd),
            _ => None,
        }
    }

    pub fn to_mm(&self, value: f64) -> f64 {
        match self {
            DimensionUnit::Mm => value,
            DimensionUnit::Cm => value * 10.0,
            DimensionUnit::M => value * 1000.0,
            DimensionUnit::In => value * 25.4,
            DimensionUnit::Yd => value * 914.4,
        }
    }
}

/// Weight unit used by the source store. All feed weights are
/// normalised to grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    G,
    Kg,
    Lbs,
    Oz,
}

impl WeightUnit {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "g" => Some(WeightUnit::G),
            "kg" => Some(WeightUnit::Kg),
            "lbs" => Some(WeightUnit::Lbs),
            "oz" => Some(WeightUnit::Oz),
            _ => None,
        }
    }

    pub fn to_grams(&self, value: f64) -> f64 {
        match self {
            WeightUnit::G => value,
            WeightUnit::Kg => value * 1000.0,
            WeightUnit::Lbs => value * 453.592,
            WeightUnit::Oz => value * 28.3495,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn dimension_conversions() {
        assert!(close(DimensionUnit::Mm.to_mm(42.0), 42.0));
        assert!(close(DimensionUnit::Cm.to_mm(10.0), 100.0));
        assert!(close(DimensionUnit::M.to_mm(1.5), 1500.0));
        assert!(close(DimensionUnit::In.to_mm(2.0), 50.8));
        assert!(close(DimensionUnit::Yd.to_mm(1.0), 914.4));
    }

    #[test]
    fn weight_conversions() {
        assert!(close(WeightUnit::G.to_grams(250.0), 250.0));
        assert!(close(WeightUnit::Kg.to_grams(0.5), 500.0));
        assert!(close(WeightUnit::Lbs.to_grams(2.0), 907.184));
        assert!(close(WeightUnit::Oz.to_grams(4.0), 113.398));
    }
}
