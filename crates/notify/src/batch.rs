//! Partitioning helpers shared by both ticks.

/// Splits addresses into request groups of at most `cap` entries.
pub(crate) fn batch_addresses<I>(addresses: I, cap: usize) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = String>,
{
    let cap = cap.max(1);
    let mut groups: Vec<Vec<String>> = Vec::new();
    for address in addresses {
        match groups.last_mut() {
            Some(last) if last.len() < cap => last.push(address),
            _ => groups.push(vec![address]),
        }
    }
    groups
}

/// Splits per-user work into at most `max_groups` chunks, one notifier task
/// each, so the notifier task count never exceeds the configured width.
pub(crate) fn partition_users<T>(users: Vec<T>, max_groups: usize) -> Vec<Vec<T>> {
    let max_groups = max_groups.max(1);
    if users.is_empty() {
        return Vec::new();
    }

    let chunk = users.len().div_ceil(max_groups);
    let mut groups = Vec::new();
    let mut iter = users.into_iter();
    loop {
        let group: Vec<T> = iter.by_ref().take(chunk).collect();
        if group.is_empty() {
            break;
        }
        groups.push(group);
    }
    groups
}
