//! # Node 模块
//!
//! 一个最小的场景节点实现，把宿主对象适配为 [`ActionTarget`]。
//!
//! 调度核心只依赖 `ActionTarget`；`SceneNode` 供测试、演示工具以及没有
//! 自己场景图的宿主直接使用。

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::math::Vec2;
use crate::target::ActionTarget;

/// 变换状态
///
/// 表示一个节点的位置、缩放、旋转和透明度。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// 位置
    pub position: Vec2,
    /// 缩放因子
    pub scale: Vec2,
    /// 旋转角度（弧度）
    pub rotation: f32,
    /// 透明度 (0.0 - 1.0)
    pub alpha: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::zero(),
            scale: Vec2::one(),
            rotation: 0.0,
            alpha: 1.0,
        }
    }
}

/// 场景节点
#[derive(Debug)]
pub struct SceneNode {
    name: String,
    transform: Cell<Transform>,
    visible: Cell<bool>,
    destroyed: Cell<bool>,
    paused: Cell<bool>,
    speed: Cell<f32>,
    /// 根节点总是视为挂载状态
    is_root: bool,
    parent: RefCell<Weak<SceneNode>>,
    children: RefCell<Vec<Rc<SceneNode>>>,
}

impl SceneNode {
    fn build(name: impl Into<String>, is_root: bool) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            transform: Cell::new(Transform::default()),
            visible: Cell::new(true),
            destroyed: Cell::new(false),
            paused: Cell::new(false),
            speed: Cell::new(1.0),
            is_root,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        })
    }

    /// 创建场景根节点
    pub fn root(name: impl Into<String>) -> Rc<Self> {
        Self::build(name, true)
    }

    /// 创建尚未挂载的节点
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Self::build(name, false)
    }

    /// 创建节点并挂到 `parent` 下
    pub fn child_of(parent: &Rc<Self>, name: impl Into<String>) -> Rc<Self> {
        let node = Self::new(name);
        parent.add_child(node.clone());
        node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 挂载子节点（若子节点已有父节点，先摘除）
    pub fn add_child(self: &Rc<Self>, child: Rc<SceneNode>) {
        child.remove_from_parent();
        *child.parent.borrow_mut() = Rc::downgrade(self);
        self.children.borrow_mut().push(child);
    }

    pub fn children_count(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn transform(&self) -> Transform {
        self.transform.get()
    }

    /// 销毁节点及其子树
    pub fn destroy(&self) {
        self.remove_from_parent();
        self.destroyed.set(true);
        for child in self.children.borrow_mut().drain(..) {
            *child.parent.borrow_mut() = Weak::new();
            child.destroy();
        }
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.set(paused);
    }

    fn update_transform(&self, f: impl FnOnce(&mut Transform)) {
        let mut transform = self.transform.get();
        f(&mut transform);
        self.transform.set(transform);
    }
}

impl ActionTarget for SceneNode {
    fn position(&self) -> Vec2 {
        self.transform.get().position
    }

    fn set_position(&self, position: Vec2) {
        self.update_transform(|t| t.position = position);
    }

    fn scale(&self) -> Vec2 {
        self.transform.get().scale
    }

    fn set_scale(&self, scale: Vec2) {
        self.update_transform(|t| t.scale = scale);
    }

    fn rotation(&self) -> f32 {
        self.transform.get().rotation
    }

    fn set_rotation(&self, rotation: f32) {
        self.update_transform(|t| t.rotation = rotation);
    }

    fn alpha(&self) -> f32 {
        self.transform.get().alpha
    }

    fn set_alpha(&self, alpha: f32) {
        self.update_transform(|t| t.alpha = alpha.clamp(0.0, 1.0));
    }

    fn is_visible(&self) -> bool {
        self.visible.get()
    }

    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn remove_from_parent(&self) {
        let parent = std::mem::take(&mut *self.parent.borrow_mut());
        if let Some(parent) = parent.upgrade() {
            parent
                .children
                .borrow_mut()
                .retain(|c| !std::ptr::eq(Rc::as_ptr(c), self));
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn is_attached(&self) -> bool {
        if self.is_root {
            return true;
        }
        self.parent
            .borrow()
            .upgrade()
            .is_some_and(|parent| parent.is_attached())
    }

    fn is_paused(&self) -> bool {
        self.paused.get()
    }

    fn speed(&self) -> f32 {
        self.speed.get()
    }

    fn set_speed(&self, speed: f32) {
        self.speed.set(speed);
    }

    fn parent(&self) -> Option<Rc<dyn ActionTarget>> {
        self.parent
            .borrow()
            .upgrade()
            .map(|p| p as Rc<dyn ActionTarget>)
    }
}
