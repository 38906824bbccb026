//! # 调度器集成测试
//!
//! 通过公开 API 验证注册表与每帧驱动的行为。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use action_runtime::{
    Action, ActionError, ActionEvent, ActionScheduler, ActionTarget, ActionTicker,
    MAX_REPEAT_ITERATIONS_PER_TICK, RepeatCount, SceneNode, SpeedMode, TickerId, Vec2,
};

fn elapsed_of(scheduler: &ActionScheduler, id: TickerId) -> f32 {
    scheduler
        .ticker(id)
        .map(ActionTicker::elapsed)
        .unwrap_or(f32::NAN)
}

fn close(a: Vec2, b: Vec2) -> bool {
    (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
}

/// 中间的 ticker 失败时，前后两个照常推进，回调只调用一次
#[test]
fn test_error_isolation() {
    let stage = SceneNode::root("stage");
    let nodes: Vec<_> = (0..3).map(|i| SceneNode::child_of(&stage, format!("n{i}"))).collect();

    let mut scheduler = ActionScheduler::new();
    let first = scheduler.run_on(&nodes[0], Action::wait(1.0));
    let failing = scheduler.run_on(
        &nodes[1],
        Action::custom_action(1.0, |_, _, _| Err(ActionError::custom("broken"))),
    );
    let third = scheduler.run_on(&nodes[2], Action::wait(1.0));

    let mut calls = Vec::new();
    let mut handler = |e: &ActionError| calls.push(e.clone());
    let events = scheduler.tick(100.0, None, Some(&mut handler));

    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].ticker(), Some(failing));
    assert!((elapsed_of(&scheduler, first) - 0.1).abs() < 1e-6);
    assert!((elapsed_of(&scheduler, third) - 0.1).abs() < 1e-6);
    assert!(!scheduler.contains(failing));
    assert!(events.contains(&ActionEvent::Failed(failing)));
}

/// 没有回调时失败被吞掉，调度继续
#[test]
fn test_error_without_handler_is_swallowed() {
    let node = SceneNode::root("n");
    let mut scheduler = ActionScheduler::new();
    let bad = scheduler.run_on(&node, Action::run(|_| Err(ActionError::custom("missing asset"))));
    let good = scheduler.run_on(&node, Action::wait(1.0));

    scheduler.tick(16.0, None, None);
    assert!(!scheduler.contains(bad));
    assert!(elapsed_of(&scheduler, good) > 0.0);
}

#[test]
fn test_category_mask_filters() {
    let node = SceneNode::root("n");
    let mut scheduler = ActionScheduler::new();
    let id = scheduler.run_on(&node, Action::wait(1.0).with_category_mask(0b10));

    scheduler.tick(100.0, Some(0b01), None);
    assert_eq!(elapsed_of(&scheduler, id), 0.0);

    scheduler.tick(100.0, Some(0b10), None);
    assert!((elapsed_of(&scheduler, id) - 0.1).abs() < 1e-6);

    scheduler.tick(100.0, None, None);
    assert!((elapsed_of(&scheduler, id) - 0.2).abs() < 1e-6);
}

/// 接续动作在前一个动作完成的同一帧注册
#[test]
fn test_continuation_registered_on_same_tick() {
    let node = SceneNode::root("n");
    let mut scheduler = ActionScheduler::new();
    let id = scheduler.run_on(&node, Action::move_by(10.0, 0.0, 0.2));
    assert!(scheduler.queue_after(id, Action::move_by(0.0, 10.0, 0.2)));

    scheduler.tick(100.0, None, None);
    assert!(scheduler.contains(id));
    assert_eq!(scheduler.len(), 1);

    let events = scheduler.tick(100.0, None, None);
    assert!(!scheduler.contains(id));
    assert!(events.contains(&ActionEvent::Completed(id)));

    let next = scheduler.ticker_ids();
    assert_eq!(next.len(), 1);
    assert!(events.contains(&ActionEvent::Started(next[0])));
    assert!(scheduler.has_target_actions(&node));
    // 新 ticker 本帧只注册，不推进
    assert_eq!(elapsed_of(&scheduler, next[0]), 0.0);

    scheduler.tick(200.0, None, None);
    assert!(close(node.position(), Vec2::new(10.0, 10.0)));
    assert!(scheduler.is_empty());
}

/// 同一帧内多个 ticker 完成并被移除，其余 ticker 各推进恰好一次
#[test]
fn test_removal_during_iteration() {
    let node = SceneNode::root("n");
    let mut scheduler = ActionScheduler::new();

    let visits = Rc::new(RefCell::new(Vec::new()));
    let mut ids = Vec::new();
    for i in 0..6 {
        let log = visits.clone();
        // 偶数下标的动作本帧完成，奇数下标的继续运行
        let duration = if i % 2 == 0 { 0.05 } else { 1.0 };
        let action = Action::custom_action(duration, move |_, _, _| {
            log.borrow_mut().push(i);
            Ok(())
        });
        ids.push(scheduler.run_on(&node, action));
    }

    scheduler.tick(100.0, None, None);
    assert_eq!(*visits.borrow(), vec![5, 4, 3, 2, 1, 0]);
    assert_eq!(scheduler.ticker_ids(), vec![ids[1], ids[3], ids[5]]);

    visits.borrow_mut().clear();
    scheduler.tick(100.0, None, None);
    assert_eq!(*visits.borrow(), vec![5, 3, 1]);
}

#[test]
fn test_invalid_targets_are_deregistered() {
    let stage = SceneNode::root("stage");
    let detached = SceneNode::child_of(&stage, "detached");
    let destroyed = SceneNode::child_of(&stage, "destroyed");
    let dropped = SceneNode::root("dropped");
    let alive = SceneNode::child_of(&stage, "alive");

    let mut scheduler = ActionScheduler::new();
    let a = scheduler.run_on(&detached, Action::wait(1.0));
    let b = scheduler.run_on(&destroyed, Action::wait(1.0));
    let c = scheduler.run_on(&dropped, Action::wait(1.0));
    let d = scheduler.run_on(&alive, Action::wait(1.0));

    detached.remove_from_parent();
    destroyed.destroy();
    drop(dropped);

    let events = scheduler.tick(16.0, None, None);
    for id in [a, b, c] {
        assert!(!scheduler.contains(id));
        assert!(events.contains(&ActionEvent::Invalidated(id)));
    }
    // 目标失效不算失败
    assert!(!events.iter().any(|e| matches!(e, ActionEvent::Failed(_))));
    assert!(scheduler.contains(d));
}

#[test]
fn test_paused_scope_and_inherited_speed() {
    let stage = SceneNode::root("stage");
    let layer = SceneNode::child_of(&stage, "layer");
    let sprite = SceneNode::child_of(&layer, "sprite");

    let mut scheduler = ActionScheduler::new();
    let id = scheduler.run_on(&sprite, Action::wait(10.0).with_speed(2.0));

    layer.set_paused(true);
    scheduler.tick(100.0, None, None);
    assert_eq!(elapsed_of(&scheduler, id), 0.0);

    layer.set_paused(false);
    stage.set_speed(0.5);
    sprite.set_speed(3.0);
    scheduler.tick(100.0, None, None);
    // 0.1 秒 × 0.5 × 3.0 × 动作速度 2.0
    assert!((elapsed_of(&scheduler, id) - 0.3).abs() < 1e-5);
}

/// 两段等长路径：固定速度下 0.25 / 0.75 落在两段的中点
#[test]
fn test_follow_path_fixed_speed_through_scheduler() {
    let node = SceneNode::root("n");
    let mut scheduler = ActionScheduler::new();
    let points = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
    scheduler.run_on(&node, Action::follow_path(points, 1.0, false, true, SpeedMode::Fixed));

    scheduler.tick(250.0, None, None);
    assert!(close(node.position(), Vec2::new(5.0, 0.0)));
    assert!(node.rotation().abs() < 1e-5);

    scheduler.tick(500.0, None, None);
    assert!(close(node.position(), Vec2::new(10.0, 5.0)));
    assert!((node.rotation() - std::f32::consts::FRAC_PI_2).abs() < 1e-5);

    let events = scheduler.tick(250.0, None, None);
    assert!(close(node.position(), Vec2::new(10.0, 10.0)));
    assert!(matches!(events.as_slice(), [ActionEvent::Completed(_)]));
}

/// 长短不一的两段：固定速度与按点序号分配的结果不同
#[test]
fn test_follow_path_speed_modes_differ() {
    let points = vec![Vec2::new(0.0, 0.0), Vec2::new(30.0, 0.0), Vec2::new(30.0, 10.0)];
    let fixed = SceneNode::root("fixed");
    let dynamic = SceneNode::root("dynamic");

    let mut scheduler = ActionScheduler::new();
    scheduler.run_on(
        &fixed,
        Action::follow_path(points.clone(), 1.0, false, false, SpeedMode::Fixed),
    );
    scheduler.run_on(
        &dynamic,
        Action::follow_path(points, 1.0, false, false, SpeedMode::Dynamic),
    );

    scheduler.tick(500.0, None, None);
    assert!(close(fixed.position(), Vec2::new(20.0, 0.0)));
    assert!(close(dynamic.position(), Vec2::new(30.0, 0.0)));
}

#[test]
fn test_run_block_fires_when_sequence_reaches_it() {
    let node = SceneNode::root("n");
    let hits = Rc::new(Cell::new(0));
    let seen = hits.clone();

    let mut scheduler = ActionScheduler::new();
    scheduler.run_on(
        &node,
        Action::sequence(vec![
            Action::fade_out(0.1),
            Action::run(move |target| {
                seen.set(seen.get() + 1);
                target.set_visible(false);
                Ok(())
            }),
        ]),
    );

    let events = scheduler.tick(100.0, None, None);
    assert_eq!(hits.get(), 1);
    assert!(!node.is_visible());
    assert!(events.iter().any(|e| matches!(e, ActionEvent::Completed(_))));
}

#[test]
fn test_remove_from_parent_invalidates_remaining_actions() {
    let stage = SceneNode::root("stage");
    let sprite = SceneNode::child_of(&stage, "sprite");

    let mut scheduler = ActionScheduler::new();
    let spin = scheduler.run_on(&sprite, Action::repeat_forever(Action::rotate_by(1.0, 1.0)));
    let exit = scheduler.run_on(
        &sprite,
        Action::sequence(vec![Action::wait(0.1), Action::remove_from_parent()]),
    );

    // 后注册的先推进：节点被摘除后，同一帧内轮到的 spin 已经失效
    let events = scheduler.tick(100.0, None, None);
    assert_eq!(stage.children_count(), 0);
    assert_eq!(
        events,
        vec![
            ActionEvent::Started(spin),
            ActionEvent::Started(exit),
            ActionEvent::Completed(exit),
            ActionEvent::Invalidated(spin),
        ]
    );
    assert!(scheduler.is_empty());
}

/// 次数极大的瞬时重复不会卡住一帧，其余 ticker 照常推进
#[test]
fn test_huge_instant_repeat_is_spread_over_ticks() {
    let node = SceneNode::root("n");
    let hits = Rc::new(Cell::new(0u32));
    let seen = hits.clone();
    let tick = Action::run(move |_| {
        seen.set(seen.get() + 1);
        Ok(())
    });

    let mut scheduler = ActionScheduler::new();
    let spam = scheduler.run_on(
        &node,
        Action::repeat_with(tick, RepeatCount::from_signed(i64::MAX)),
    );
    let timer = scheduler.run_on(&node, Action::wait(1.0));

    scheduler.tick(16.0, None, None);
    assert_eq!(hits.get(), MAX_REPEAT_ITERATIONS_PER_TICK);
    assert!(scheduler.contains(spam));
    assert!((elapsed_of(&scheduler, timer) - 0.016).abs() < 1e-6);

    scheduler.tick(16.0, None, None);
    assert_eq!(hits.get(), 2 * MAX_REPEAT_ITERATIONS_PER_TICK);
}
