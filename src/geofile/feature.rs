use std::collections::HashMap;
use std::fmt;

/// Attribute value of a feature, mapped to the matching GDAL field type on write.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Real(f64),
}

impl AttributeValue {
    pub fn field_type(&self) -> gdal::vector::OGRFieldType::Type {
        use gdal::vector::OGRFieldType::*;
        match self {
            AttributeValue::String(_) => OFTString,
            AttributeValue::Integer(_) => OFTInteger64,
            AttributeValue::Real(_) => OFTReal,
        }
    }

    pub fn to_field_value(&self) -> gdal::vector::FieldValue {
        use gdal::vector::FieldValue;
        match self {
            AttributeValue::String(value) => FieldValue::StringValue(value.clone()),
            AttributeValue::Integer(value) => FieldValue::Integer64Value(*value),
            AttributeValue::Real(value) => FieldValue::RealValue(*value),
        }
    }

    /// Convert a GDAL field value. Dates and list values are not supported.
    pub fn from_field_value(value: gdal::vector::FieldValue) -> Option<Self> {
        use gdal::vector::FieldValue;
        match value {
            FieldValue::StringValue(value) => Some(AttributeValue::String(value)),
            FieldValue::IntegerValue(value) => Some(AttributeValue::Integer(value as i64)),
            FieldValue::Integer64Value(value) => Some(AttributeValue::Integer(value)),
            FieldValue::RealValue(value) => Some(AttributeValue::Real(value)),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(value) => write!(f, "{}", value),
            AttributeValue::Integer(value) => write!(f, "{}", value),
            AttributeValue::Real(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Real(value)
    }
}

pub type FeatureMap = HashMap<String, AttributeValue>;

#[derive(Debug)]
pub struct Feature {
    pub geometry: geo::Geometry,
    /// Feature id as assigned by the data source, if any.
    pub fid: Option<u64>,
    pub attributes: Option<FeatureMap>,
}

impl Feature {
    /// Look up an attribute and render it as a string.
    pub fn attribute_string(&self, key: &str) -> Option<String> {
        self.attributes
            .as_ref()
            .and_then(|attributes| attributes.get(key))
            .map(|value| value.to_string())
    }
}

impl From<geo::Geometry> for Feature {
    fn from(value: geo::Geometry) -> Self {
        Self {
            geometry: value,
            fid: None,
            attributes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{AttributeValue, Feature};

    #[test]
    fn test_attribute_string() {
        let feature = Feature {
            geometry: geo::Geometry::Point(geo::Point::new(-9.05, 53.27)),
            fid: Some(3),
            attributes: Some(HashMap::from([
                ("name".to_string(), AttributeValue::from("Galway")),
                ("osm_id".to_string(), AttributeValue::from(4021_i64)),
                ("area".to_string(), AttributeValue::from(6148.5)),
            ])),
        };
        assert_eq!(Some("Galway".to_string()), feature.attribute_string("name"));
        assert_eq!(Some("4021".to_string()), feature.attribute_string("osm_id"));
        assert_eq!(Some("6148.5".to_string()), feature.attribute_string("area"));
        assert_eq!(None, feature.attribute_string("missing"));
    }

    #[test]
    fn test_field_value_conversion() {
        let value = gdal::vector::FieldValue::IntegerValue(12);
        assert_eq!(
            Some(AttributeValue::Integer(12)),
            AttributeValue::from_field_value(value)
        );
        assert_eq!(
            Some(AttributeValue::Real(1.25)),
            AttributeValue::from_field_value(AttributeValue::Real(1.25).to_field_value())
        );
    }
}
