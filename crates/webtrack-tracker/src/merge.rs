//! 전송 실패 배치 재병합.
//!
//! 실패한 배치를 현재 버퍼 앞에 다시 넣는다. 용량 초과 시에는
//! 실패 이후 새로 들어온 항목 중 오래된 것부터 버리고, 실패 배치만으로
//! 용량을 넘으면 실패 배치의 오래된 항목을 버린다.

/// 실패 배치 + 현재 버퍼 병합 — 결과 길이는 항상 `capacity` 이하
pub fn merge_failed<T>(failed: Vec<T>, current: Vec<T>, capacity: usize) -> Vec<T> {
    if failed.len() >= capacity {
        let skip = failed.len() - capacity;
        return failed.into_iter().skip(skip).collect();
    }

    let room = capacity - failed.len();
    let skip = current.len().saturating_sub(room);
    let mut merged = failed;
    merged.extend(current.into_iter().skip(skip));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_first_then_newest_current() {
        let failed = vec!["f1", "f2", "f3"];
        let current = vec!["n1", "n2", "n3", "n4", "n5"];
        assert_eq!(
            merge_failed(failed, current, 6),
            vec!["f1", "f2", "f3", "n3", "n4", "n5"]
        );
    }

    #[test]
    fn keeps_everything_under_capacity() {
        assert_eq!(merge_failed(vec![1, 2], vec![3], 5), vec![1, 2, 3]);
        assert_eq!(merge_failed(Vec::<u8>::new(), vec![], 5), Vec::<u8>::new());
    }

    #[test]
    fn oversized_failed_batch_drops_its_oldest() {
        assert_eq!(merge_failed(vec![1, 2, 3, 4], vec![5, 6], 3), vec![2, 3, 4]);
    }

    #[test]
    fn failed_exactly_at_capacity_drops_current() {
        assert_eq!(merge_failed(vec![1, 2, 3], vec![4, 5], 3), vec![1, 2, 3]);
    }

    #[test]
    fn zero_capacity_is_empty() {
        assert!(merge_failed(vec![1], vec![2], 0).is_empty());
    }
}
