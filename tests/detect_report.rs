//! Wire-format checks for the detailed detection report.
//!
//! The JSON shape is consumed downstream; these tests pin the exact byte
//! layout, not just the field values.

use trashwatch::{evaluate_detailed, ClassFilter, Detection};

fn detection(class_name: &str, confidence: f32, bbox: [f32; 4]) -> Detection {
    Detection {
        class_name: class_name.to_string(),
        confidence,
        bbox,
    }
}

#[test]
fn worked_example_serializes_bit_exact() {
    let detections = [detection("bottle", 0.62, [0.0, 0.0, 10.0, 10.0])];
    let filter = ClassFilter::new(vec!["bottle".to_string(), "can".to_string()]);

    let report = evaluate_detailed(&detections, &filter, 0.4);
    let json = serde_json::to_string(&report).expect("serialize report");

    assert_eq!(
        json,
        r#"{"trashDetected":true,"confidence":0.62,"detections":[{"class":"bottle","confidence":0.62,"bbox":[0.0,0.0,10.0,10.0]}]}"#
    );
}

#[test]
fn empty_detections_serialize_bit_exact() {
    let report = evaluate_detailed(&[], &ClassFilter::everything(), 0.4);
    let json = serde_json::to_string(&report).expect("serialize report");

    assert_eq!(
        json,
        r#"{"trashDetected":false,"confidence":0.0,"detections":[]}"#
    );
}

#[test]
fn non_trash_detections_stay_in_the_report() {
    let detections = [
        detection("person", 0.9, [1.0, 2.0, 3.0, 4.0]),
        detection("bottle", 0.5, [5.0, 6.0, 7.0, 8.0]),
    ];
    let filter = ClassFilter::new(vec!["bottle".to_string()]);

    let report = evaluate_detailed(&detections, &filter, 0.4);
    let value: serde_json::Value =
        serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();

    assert_eq!(value["trashDetected"], true);
    assert_eq!(value["detections"].as_array().unwrap().len(), 2);
    assert_eq!(value["detections"][0]["class"], "person");
}
