use crate::error::ParseError;
use crate::pipeline::parse::Parser;
use crate::types::activity::{FileFormat, ParsedActivity, TrackPoint};
use chrono::DateTime;
use fitparser::profile::MesgNum;
use fitparser::Value;

pub struct FitParser;

impl Parser for FitParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedActivity, ParseError> {
        let data = fitparser::from_bytes(bytes)
            .map_err(|e| ParseError::InvalidFit(format!("Failed to parse FIT file: {}", e)))?;

        let mut points = Vec::new();

        for record in data {
            if record.kind() != MesgNum::Record {
                continue;
            }

            let mut point = TrackPoint::new(0.0, 0.0);
            let mut has_lat = false;
            let mut has_lon = false;

            for field in record.fields() {
                match (field.name(), field.value()) {
                    ("position_lat", Value::SInt32(val)) => {
                        point.lat = semicircles_to_degrees(*val);
                        has_lat = true;
                    }
                    ("position_long", Value::SInt32(val)) => {
                        point.lon = semicircles_to_degrees(*val);
                        has_lon = true;
                    }
                    ("timestamp", Value::Timestamp(val)) => {
                        point.time = DateTime::from_timestamp(val.timestamp(), 0);
                    }
                    ("heart_rate", Value::UInt8(val)) => {
                        point.heart_rate = Some(*val as u16);
                    }
                    ("speed" | "enhanced_speed", Value::Float64(val)) => {
                        point.speed_ms = Some(*val);
                    }
                    _ => {}
                }
            }

            if has_lat && has_lon {
                points.push(point);
            }
        }

        if points.is_empty() {
            return Err(ParseError::EmptyFile);
        }

        Ok(ParsedActivity {
            points,
            file_format: FileFormat::Fit,
        })
    }
}

fn semicircles_to_degrees(semicircles: i32) -> f64 {
    (semicircles as f64) * (180.0 / 2_147_483_648.0)
}
