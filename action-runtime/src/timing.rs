//! # Timing 模块
//!
//! 时间曲线库：把线性时间进度映射为缓动后的进度。
//!
//! 输入会被限制在 [0, 1]，输出不做限制（`EaseOutBack`、`EaseOutElastic` 等会越界）。

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// 时间曲线
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// 线性（匀速）
    #[default]
    Linear,
    /// 缓入（先慢后快）
    EaseIn,
    /// 缓出（先快后慢）
    EaseOut,
    /// 缓入缓出（两头慢中间快）
    EaseInOut,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 二次缓入缓出
    EaseInOutQuad,
    /// 三次缓入
    EaseInCubic,
    /// 三次缓出
    EaseOutCubic,
    /// 三次缓入缓出
    EaseInOutCubic,
    /// 正弦缓入
    EaseInSine,
    /// 正弦缓出
    EaseOutSine,
    /// 正弦缓入缓出
    EaseInOutSine,
    /// 回弹缓入（起步先反向）
    EaseInBack,
    /// 回弹缓出（末尾越过终点再回来）
    EaseOutBack,
    /// 弹性缓出
    EaseOutElastic,
    /// 弹跳缓出
    EaseOutBounce,
    /// 调用方提供的曲线
    #[serde(skip)]
    Custom(fn(f32) -> f32),
}

impl PartialEq for TimingMode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(a), Self::Custom(b)) => *a as usize == *b as usize,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl TimingMode {
    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度，超出 [0, 1] 会被限制
    ///
    /// # 返回
    /// - 缓动后的进度值，可能超出 [0, 1]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            TimingMode::Linear => t,
            TimingMode::EaseIn | TimingMode::EaseInCubic => t * t * t,
            TimingMode::EaseOut | TimingMode::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            TimingMode::EaseInOut | TimingMode::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            TimingMode::EaseInQuad => t * t,
            TimingMode::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            TimingMode::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            TimingMode::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            TimingMode::EaseOutSine => (t * PI / 2.0).sin(),
            TimingMode::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            TimingMode::EaseInBack => ease_in_back(t),
            TimingMode::EaseOutBack => 1.0 - ease_in_back(1.0 - t),
            TimingMode::EaseOutElastic => ease_out_elastic(t),
            TimingMode::EaseOutBounce => ease_out_bounce(t),
            TimingMode::Custom(f) => f(t),
        }
    }

    /// 反向动作使用的曲线：缓入与缓出互换
    pub fn reversed(self) -> Self {
        match self {
            Self::EaseIn => Self::EaseOut,
            Self::EaseOut => Self::EaseIn,
            Self::EaseInQuad => Self::EaseOutQuad,
            Self::EaseOutQuad => Self::EaseInQuad,
            Self::EaseInCubic => Self::EaseOutCubic,
            Self::EaseOutCubic => Self::EaseInCubic,
            Self::EaseInSine => Self::EaseOutSine,
            Self::EaseOutSine => Self::EaseInSine,
            Self::EaseInBack => Self::EaseOutBack,
            Self::EaseOutBack => Self::EaseInBack,
            other => other,
        }
    }
}

const BACK_C1: f32 = 1.70158;

fn ease_in_back(t: f32) -> f32 {
    let c3 = BACK_C1 + 1.0;
    c3 * t * t * t - BACK_C1 * t * t
}

/// 弹性缓出
fn ease_out_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
    }
}

/// 弹跳缓出
fn ease_out_bounce(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let mode = TimingMode::Linear;
        assert_eq!(mode.apply(0.0), 0.0);
        assert_eq!(mode.apply(0.5), 0.5);
        assert_eq!(mode.apply(1.0), 1.0);
    }

    #[test]
    fn test_ease_in_out() {
        let mode = TimingMode::EaseInOut;
        assert_eq!(mode.apply(0.0), 0.0);
        assert_eq!(mode.apply(1.0), 1.0);
        let mid = mode.apply(0.5);
        assert!((mid - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_input_clamped() {
        let mode = TimingMode::Linear;
        assert_eq!(mode.apply(-0.5), 0.0);
        assert_eq!(mode.apply(1.5), 1.0);
    }

    #[test]
    fn test_output_may_overshoot() {
        let peak = (1..100)
            .map(|i| TimingMode::EaseOutBack.apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
        assert!(TimingMode::EaseInBack.apply(0.2) < 0.0);
        assert!((TimingMode::EaseOutBack.apply(1.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ease_out_bounce() {
        let mode = TimingMode::EaseOutBounce;
        assert_eq!(mode.apply(0.0), 0.0);
        assert!((mode.apply(1.0) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_custom_and_reversed() {
        fn half(t: f32) -> f32 {
            t * 0.5
        }
        let mode = TimingMode::Custom(half);
        assert_eq!(mode.apply(1.0), 0.5);
        assert_eq!(mode.reversed(), mode);
        assert_eq!(TimingMode::EaseInQuad.reversed(), TimingMode::EaseOutQuad);
        assert_eq!(TimingMode::EaseInOut.reversed(), TimingMode::EaseInOut);
    }

    #[test]
    fn test_serde_names() {
        let mode: TimingMode = serde_json::from_str("\"ease_out_quad\"").unwrap();
        assert_eq!(mode, TimingMode::EaseOutQuad);
    }
}
