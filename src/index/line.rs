//! Text encoding of a single index entry

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::BlockLocation;

/// Encode one entry as `base64(key) count (file offset size)*`
pub(super) fn encode_entry(key: &[u8], locations: &[BlockLocation]) -> String {
    let mut line = BASE64.encode(key);
    line.push(' ');
    line.push_str(&locations.len().to_string());
    for location in locations {
        line.push_str(&format!(
            " {} {} {}",
            location.file_name, location.offset, location.size
        ));
    }
    line
}

/// Decode one non-empty line. The error is a human readable reason; the
/// caller attaches the file and line number.
pub(super) fn decode_entry(line: &str) -> Result<(Vec<u8>, Vec<BlockLocation>), String> {
    // An empty key encodes to an empty token, so leading separators are
    // significant and only the end of the line is trimmed.
    let tokens: Vec<&str> = line.trim_end().split(char::is_whitespace).collect();
    if tokens.len() < 2 {
        return Err(format!("expected at least 2 tokens, found {}", tokens.len()));
    }

    let key = BASE64
        .decode(tokens[0])
        .map_err(|e| format!("invalid base64 key {:?}: {}", tokens[0], e))?;

    let count: usize = tokens[1]
        .parse()
        .map_err(|_| format!("invalid block count {:?}", tokens[1]))?;

    let expected = count
        .checked_mul(3)
        .and_then(|n| n.checked_add(2))
        .ok_or_else(|| format!("block count {} is too large", count))?;
    if tokens.len() != expected {
        return Err(format!(
            "block count {} needs {} tokens, found {}",
            count,
            expected,
            tokens.len()
        ));
    }

    let mut locations = Vec::with_capacity(count);
    for triple in tokens[2..].chunks_exact(3) {
        let offset: u64 = triple[1]
            .parse()
            .map_err(|_| format!("invalid offset {:?}", triple[1]))?;
        let size: u64 = triple[2]
            .parse()
            .map_err(|_| format!("invalid size {:?}", triple[2]))?;
        if offset.checked_add(size).is_none() {
            return Err(format!(
                "block {} at offset {} with size {} runs past u64::MAX",
                triple[0], offset, size
            ));
        }
        locations.push(BlockLocation::new(triple[0], offset, size));
    }

    Ok((key, locations))
}
