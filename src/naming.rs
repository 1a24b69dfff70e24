/// characters that can't be part of a filename on at least one platform
const ILLEGAL_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

pub fn sanitize_filename(name: &str) -> String {
    name.replace(ILLEGAL_CHARS, "_")
}

/// name for the sound at `index` (0-based) when the bank has no name left for it
pub fn fallback_name(index: usize) -> String {
    format!("sound_{:02}.wav", index + 1)
}

/// Gives each of the `count` sounds a filename. The names found in the bank
/// are used in the order they were found, there is no guarantee the n-th name
/// actually belongs to the n-th sound.
pub fn assign_names(names: &[String], count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match names.get(i) {
            Some(name) => sanitize_filename(name),
            None => fallback_name(i),
        })
        .collect()
}
