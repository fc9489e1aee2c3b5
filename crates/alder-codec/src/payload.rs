//! Payload encoding and decoding.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::{json, Map, Number, Value};

use alder_types::{CapValue, StateRecord, Vref};

use crate::error::CodecError;

const REF_MARKER: &str = "@ref";

/// An encoded payload plus the references embedded in it.
#[derive(Clone, Debug)]
pub struct EncodedPayload {
    pub bytes: Vec<u8>,
    pub refs: BTreeSet<Vref>,
}

/// Encode a state record for the backing store.
pub fn encode_state(state: &StateRecord) -> Result<EncodedPayload, CodecError> {
    let mut slots = SlotTable::default();
    let mut body = Map::new();
    for (field, value) in state.fields() {
        if field == REF_MARKER {
            return Err(CodecError::ReservedField(field.clone()));
        }
        body.insert(field.clone(), slots.encode(value)?);
    }
    slots.finish(Value::Object(body))
}

/// Decode a state record, reporting its embedded references.
pub fn decode_state(bytes: &[u8]) -> Result<(StateRecord, BTreeSet<Vref>), CodecError> {
    let (body, slots) = open_payload(bytes)?;
    let fields = match body {
        Value::Object(map) => map,
        other => {
            return Err(CodecError::Malformed(format!(
                "state body must be an object, got {other}"
            )))
        }
    };
    let mut record = StateRecord::new();
    for (field, value) in fields {
        record.set(field, decode_body(&value, &slots)?);
    }
    let refs = slots.into_iter().collect();
    Ok((record, refs))
}

/// Encode a single storable value (collection snapshots).
pub fn encode_value(value: &CapValue) -> Result<EncodedPayload, CodecError> {
    let mut slots = SlotTable::default();
    let body = slots.encode(value)?;
    slots.finish(body)
}

/// Decode a single storable value, reporting its embedded references.
pub fn decode_value(bytes: &[u8]) -> Result<(CapValue, BTreeSet<Vref>), CodecError> {
    let (body, slots) = open_payload(bytes)?;
    let value = decode_body(&body, &slots)?;
    let refs = slots.into_iter().collect();
    Ok((value, refs))
}

/// Slot table built up during encoding: first occurrence order, deduplicated.
#[derive(Default)]
struct SlotTable {
    slots: Vec<Vref>,
    index: HashMap<Vref, usize>,
}

impl SlotTable {
    fn slot_for(&mut self, vref: &Vref) -> usize {
        if let Some(&i) = self.index.get(vref) {
            return i;
        }
        let i = self.slots.len();
        self.slots.push(vref.clone());
        self.index.insert(vref.clone(), i);
        i
    }

    fn encode(&mut self, value: &CapValue) -> Result<Value, CodecError> {
        Ok(match value {
            CapValue::Null => Value::Null,
            CapValue::Bool(b) => Value::Bool(*b),
            CapValue::Int(n) => Value::Number((*n).into()),
            CapValue::Float(x) => {
                Value::Number(Number::from_f64(*x).ok_or(CodecError::NonFiniteFloat)?)
            }
            CapValue::Str(s) => Value::String(s.clone()),
            CapValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.encode(item))
                    .collect::<Result<_, _>>()?,
            ),
            CapValue::Record(fields) => {
                let mut map = Map::new();
                for (field, inner) in fields {
                    if field == REF_MARKER {
                        return Err(CodecError::ReservedField(field.clone()));
                    }
                    map.insert(field.clone(), self.encode(inner)?);
                }
                Value::Object(map)
            }
            CapValue::Ref(vref) => json!({ REF_MARKER: self.slot_for(vref) }),
        })
    }

    fn finish(self, body: Value) -> Result<EncodedPayload, CodecError> {
        let refs: BTreeSet<Vref> = self.slots.iter().cloned().collect();
        let slot_strings: Vec<String> =
            self.slots.into_iter().map(|vref| vref.to_string()).collect();
        let bytes = serde_json::to_vec(&json!({ "body": body, "slots": slot_strings }))?;
        Ok(EncodedPayload { bytes, refs })
    }
}

fn open_payload(bytes: &[u8]) -> Result<(Value, Vec<Vref>), CodecError> {
    let outer: Value = serde_json::from_slice(bytes)?;
    let Value::Object(mut map) = outer else {
        return Err(CodecError::Malformed("payload is not an object".to_string()));
    };
    let body = map
        .remove("body")
        .ok_or_else(|| CodecError::Malformed("payload has no body".to_string()))?;
    let slots_value = map
        .remove("slots")
        .ok_or_else(|| CodecError::Malformed("payload has no slots".to_string()))?;
    let Value::Array(raw_slots) = slots_value else {
        return Err(CodecError::Malformed("slots is not an array".to_string()));
    };
    let mut slots = Vec::with_capacity(raw_slots.len());
    for raw in raw_slots {
        let Value::String(s) = raw else {
            return Err(CodecError::Malformed("slot is not a string".to_string()));
        };
        slots.push(s.parse::<Vref>()?);
    }
    Ok((body, slots))
}

fn decode_body(value: &Value, slots: &[Vref]) -> Result<CapValue, CodecError> {
    Ok(match value {
        Value::Null => CapValue::Null,
        Value::Bool(b) => CapValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                CapValue::Int(i)
            } else if let Some(x) = n.as_f64() {
                CapValue::Float(x)
            } else {
                return Err(CodecError::Malformed(format!("unrepresentable number {n}")));
            }
        }
        Value::String(s) => CapValue::Str(s.clone()),
        Value::Array(items) => CapValue::List(
            items
                .iter()
                .map(|item| decode_body(item, slots))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            if let Some(marker) = map.get(REF_MARKER) {
                if map.len() != 1 {
                    return Err(CodecError::Malformed(
                        "reference marker has extra fields".to_string(),
                    ));
                }
                let index = marker
                    .as_u64()
                    .ok_or_else(|| CodecError::Malformed("marker is not an index".to_string()))?;
                let vref = slots
                    .get(index as usize)
                    .ok_or(CodecError::BadSlot(index))?;
                return Ok(CapValue::Ref(vref.clone()));
            }
            let mut fields = BTreeMap::new();
            for (field, inner) in map {
                fields.insert(field.clone(), decode_body(inner, slots)?);
            }
            CapValue::Record(fields)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alder_types::StateRecord;

    fn holder_state(held: CapValue) -> StateRecord {
        StateRecord::from_fields([("held", held)])
    }

    #[test]
    fn encode_reports_embedded_refs() {
        let state = holder_state(CapValue::Ref(Vref::Import(1001)));
        let encoded = encode_state(&state).unwrap();
        assert_eq!(
            encoded.refs.into_iter().collect::<Vec<_>>(),
            vec![Vref::Import(1001)]
        );
    }

    #[test]
    fn plain_data_reports_no_refs() {
        let state = holder_state(CapValue::from("not yet"));
        let encoded = encode_state(&state).unwrap();
        assert!(encoded.refs.is_empty());
    }

    #[test]
    fn decode_recovers_state_and_refs() {
        let state = StateRecord::from_fields([
            ("held", CapValue::Ref(Vref::Import(5))),
            (
                "meta",
                CapValue::record([
                    ("label", CapValue::from("vault")),
                    ("owner", CapValue::Ref(Vref::Virtual { kind: "acct".to_string(), index: 2 })),
                ]),
            ),
            ("count", CapValue::from(2i64)),
        ]);
        let encoded = encode_state(&state).unwrap();
        let (decoded, refs) = decode_state(&encoded.bytes).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(refs, encoded.refs);
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn duplicate_refs_share_a_slot() {
        let same = Vref::Import(9);
        let value = CapValue::List(vec![
            CapValue::Ref(same.clone()),
            CapValue::Ref(same.clone()),
        ]);
        let encoded = encode_value(&value).unwrap();
        let (decoded, refs) = decode_value(&encoded.bytes).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn reserved_field_is_rejected() {
        let state = StateRecord::from_fields([("@ref", CapValue::from(0i64))]);
        assert!(matches!(
            encode_state(&state),
            Err(CodecError::ReservedField(_))
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(decode_state(b"definitely not json").is_err());
        assert!(decode_state(b"{\"body\": {}}").is_err());
        // marker pointing past the slot table
        let bad = br#"{"body": {"held": {"@ref": 3}}, "slots": []}"#;
        assert!(matches!(
            decode_state(bad),
            Err(CodecError::BadSlot(3))
        ));
    }
}
