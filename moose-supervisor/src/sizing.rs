//! Worker count sizing.

/// Default `maxCpuUsageRatio` for streaming workers: a transform worker
/// leaves headroom for the broker client's own I/O threads.
pub const DEFAULT_STREAMING_CPU_RATIO: f64 = 0.5;

/// Default `maxCpuUsageRatio` for gateway workers: one worker per core.
pub const DEFAULT_GATEWAY_CPU_RATIO: f64 = 1.0;

/// `N = min(max_worker_count, floor(available_cpu * max_cpu_usage_ratio))`,
/// always at least 1.
pub fn worker_count(available_cpu: usize, max_cpu_usage_ratio: f64, max_worker_count: Option<usize>) -> usize {
    let by_ratio = ((available_cpu as f64) * max_cpu_usage_ratio).floor() as usize;
    let sized = match max_worker_count {
        Some(cap) => by_ratio.min(cap),
        None => by_ratio,
    };
    sized.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_floors_and_is_capped_by_max_worker_count() {
        assert_eq!(worker_count(8, 0.5, None), 4);
        assert_eq!(worker_count(8, 0.5, Some(2)), 2);
    }

    #[test]
    fn uncapped_ratio_sizing_uses_the_full_floor() {
        assert_eq!(worker_count(5, 1.0, None), 5);
    }

    #[test]
    fn never_sizes_below_one_worker() {
        assert_eq!(worker_count(1, 0.1, None), 1);
        assert_eq!(worker_count(0, 1.0, None), 1);
    }

    #[test]
    fn odd_cpu_counts_floor_toward_zero_before_the_minimum_clamp() {
        // 3 * 0.5 = 1.5, floors to 1.
        assert_eq!(worker_count(3, 0.5, None), 1);
    }
}
