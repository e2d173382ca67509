//! 샘플러 포트.
//!
//! 확률적 드롭 판정. 테스트에서는 고정 시퀀스 샘플러로 교체한다.

/// [0, 1) 난수 공급자
pub trait Sampler: Send + Sync {
    /// 다음 난수
    fn next_f64(&self) -> f64;

    /// `rate` 비율로 유지할지 판정 (`random() > rate`이면 드롭)
    fn keep(&self, rate: f64) -> bool {
        if rate >= 1.0 {
            return true;
        }
        if rate <= 0.0 {
            return false;
        }
        self.next_f64() <= rate
    }
}

/// `rand` 기반 기본 샘플러
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn next_f64(&self) -> f64 {
        rand::random::<f64>()
    }
}
