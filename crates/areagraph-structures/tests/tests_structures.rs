use areagraph_structures::{AreaId, AreaPair, NeuronId, Position, TrackedKey};

#[test]
fn test_area_serializes_as_label() {
    let area = AreaId::new(8);
    let json = serde_json::to_string(&area).unwrap();
    assert_eq!(json, "\"area_8\"");
    let back: AreaId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, area);
}

#[test]
fn test_area_deserialize_rejects_bad_label() {
    let result: Result<AreaId, _> = serde_json::from_str("\"background\"");
    assert!(result.is_err());
}

#[test]
fn test_tracked_key_json_shape() {
    let key = TrackedKey::Pair(AreaPair::undirected(AreaId::new(34), AreaId::new(8)));
    let json = serde_json::to_value(key).unwrap();
    assert_eq!(json["pair"]["first"], "area_8");
    assert_eq!(json["pair"]["second"], "area_34");

    let key = TrackedKey::Area(AreaId::new(30));
    assert_eq!(serde_json::to_value(key).unwrap()["area"], "area_30");
}

#[test]
fn test_neuron_and_position_json() {
    assert_eq!(serde_json::to_string(&NeuronId(7)).unwrap(), "7");
    let p = Position::new(1.0, 2.0, 3.0);
    let json = serde_json::to_value(p).unwrap();
    assert_eq!(json["x"], 1.0);
    assert_eq!(json["z"], 3.0);
}

#[test]
fn test_display_forms() {
    let pair = AreaPair::directed(AreaId::new(1), AreaId::new(2));
    assert_eq!(pair.to_string(), "area_1-area_2");
    assert_eq!(TrackedKey::from(pair).to_string(), "area_1-area_2");
    assert_eq!(TrackedKey::from(AreaId::new(4)).to_string(), "area_4");
}
