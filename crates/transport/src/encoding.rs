/// Percent-encoding for the upstream's structured query grammar.
///
/// The grammar writes nested values directly into query parameters, e.g.
/// `dateRange=(start:(year:2023,month:1,day:1),end:(...))` and
/// `campaigns=List(urn%3Ali%3AsponsoredCampaign%3A123)`. Standard form
/// encoding would escape the parentheses, colons and commas and
/// double-escape the pre-encoded URN separators, so those bytes pass
/// through untouched.
const GRAMMAR_BYTES: &[u8] = b"():,%";

pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b if GRAMMAR_BYTES.contains(&b) => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Renders `key=value&key=value` with both sides encoded.
pub fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}
