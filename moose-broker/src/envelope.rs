//! Schema-registry envelope handling.
//!
//! Incoming broker values starting with `0x00` carry a 5-byte prefix: a
//! magic byte plus a 4-byte big-endian schema id. Strip it before JSON
//! decoding.

/// If `payload` starts with the confluent-style magic byte `0x00`,
/// interpret the next 4 bytes as a big-endian schema id and return
/// `(schema_id, remainder)`. Otherwise return `(None, payload)` unchanged.
pub fn strip_schema_registry_envelope(payload: &[u8]) -> (Option<u32>, &[u8]) {
    if payload.len() >= 5 && payload[0] == 0x00 {
        let schema_id = u32::from_be_bytes([payload[1], payload[2], payload[3], payload[4]]);
        (Some(schema_id), &payload[5..])
    } else {
        (None, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_five_byte_envelope() {
        let mut payload = vec![0x00, 0x00, 0x00, 0x00, 0x2a];
        payload.extend_from_slice(b"{\"a\":1}");
        let (schema_id, rest) = strip_schema_registry_envelope(&payload);
        assert_eq!(schema_id, Some(42));
        assert_eq!(rest, b"{\"a\":1}");
    }

    #[test]
    fn leaves_payload_without_magic_byte_untouched() {
        let payload = b"{\"a\":1}".to_vec();
        let (schema_id, rest) = strip_schema_registry_envelope(&payload);
        assert_eq!(schema_id, None);
        assert_eq!(rest, payload.as_slice());
    }

    #[test]
    fn leaves_short_payload_untouched() {
        let payload = vec![0x00, 0x01];
        let (schema_id, rest) = strip_schema_registry_envelope(&payload);
        assert_eq!(schema_id, None);
        assert_eq!(rest, payload.as_slice());
    }
}
