//! # Target 模块
//!
//! 动作目标的能力接口。
//!
//! 调度器不拥有目标：ticker 只持有 `Weak` 引用，目标的销毁完全由宿主决定，
//! 调度器只在每帧检查目标是否仍然有效。
//!
//! 所有 setter 都接收 `&self`，实现方使用内部可变性（`Cell` / `RefCell`），
//! 这样多个动作可以同时修改同一个目标的不同属性。

use std::rc::Rc;

use crate::math::Vec2;

/// 可被动作驱动的对象
///
/// ## 实现示例
///
/// ```rust,ignore
/// struct Sprite {
///     position: Cell<Vec2>,
///     alpha: Cell<f32>,
///     // ...
/// }
///
/// impl ActionTarget for Sprite {
///     fn position(&self) -> Vec2 { self.position.get() }
///     fn set_position(&self, position: Vec2) { self.position.set(position) }
///     // ...
/// }
/// ```
pub trait ActionTarget: 'static {
    fn position(&self) -> Vec2;
    fn set_position(&self, position: Vec2);

    fn scale(&self) -> Vec2;
    fn set_scale(&self, scale: Vec2);

    /// 旋转角度（弧度）
    fn rotation(&self) -> f32;
    fn set_rotation(&self, rotation: f32);

    /// 透明度 (0.0 - 1.0)
    fn alpha(&self) -> f32;
    fn set_alpha(&self, alpha: f32);

    fn is_visible(&self) -> bool;
    fn set_visible(&self, visible: bool);

    /// 从父节点上摘除
    fn remove_from_parent(&self);

    /// 目标是否已被销毁
    fn is_destroyed(&self) -> bool;

    /// 目标是否仍挂在有效的场景上
    fn is_attached(&self) -> bool {
        true
    }

    /// 目标自身是否暂停（祖先的暂停状态由调度器沿 `parent` 查询）
    fn is_paused(&self) -> bool {
        false
    }

    /// 目标自身的速度倍率
    fn speed(&self) -> f32 {
        1.0
    }

    /// 修改速度倍率（不支持速度作用域的目标可以忽略）
    fn set_speed(&self, _speed: f32) {}

    /// 父对象，用于暂停与速度的作用域继承
    fn parent(&self) -> Option<Rc<dyn ActionTarget>> {
        None
    }
}

/// 目标是否仍可调度
pub fn is_live(target: &dyn ActionTarget) -> bool {
    !target.is_destroyed() && target.is_attached()
}

/// 目标或任一祖先处于暂停状态
pub fn is_paused_in_scope(target: &dyn ActionTarget) -> bool {
    if target.is_paused() {
        return true;
    }
    let mut current = target.parent();
    while let Some(node) = current {
        if node.is_paused() {
            return true;
        }
        current = node.parent();
    }
    false
}

/// 目标自身与所有祖先速度倍率的乘积
pub fn inherited_speed(target: &dyn ActionTarget) -> f32 {
    let mut speed = target.speed();
    let mut current = target.parent();
    while let Some(node) = current {
        speed *= node.speed();
        current = node.parent();
    }
    speed
}
