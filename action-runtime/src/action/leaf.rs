//! 叶子动作：直接写目标的单个属性。
//!
//! 相对动作（`*_by`）按进度增量累加，允许多个相对动作叠加在同一属性上；
//! 绝对动作（`*_to`）在 setup 时记下起始值，再按进度插值。

use super::ActionKind;
use crate::error::ActionResult;
use crate::math::Vec2;
use crate::target::ActionTarget;
use crate::ticker::TickerData;

pub(super) fn setup(kind: &ActionKind, target: &dyn ActionTarget) -> TickerData {
    match kind {
        ActionKind::MoveTo { .. } => TickerData::StartVector(target.position()),
        ActionKind::ScaleTo { .. } => TickerData::StartVector(target.scale()),
        ActionKind::ScaleBy(factor) => {
            let start = target.scale();
            TickerData::ScaleDelta(Vec2::new(
                start.x * factor.x - start.x,
                start.y * factor.y - start.y,
            ))
        }
        ActionKind::RotateTo(_) => TickerData::StartScalar(target.rotation()),
        ActionKind::FadeAlphaTo(_) => TickerData::StartScalar(target.alpha()),
        ActionKind::SpeedTo(_) => TickerData::StartScalar(target.speed()),
        _ => TickerData::Empty,
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

pub(super) fn update(
    kind: &ActionKind,
    target: &dyn ActionTarget,
    progress: f32,
    progress_delta: f32,
    data: &TickerData,
    delta_time: f32,
) -> ActionResult<bool> {
    match (kind, data) {
        (ActionKind::MoveBy(offset), _) => {
            target.set_position(target.position() + *offset * progress_delta);
        }
        (ActionKind::MoveTo { x, y }, TickerData::StartVector(start)) => {
            let current = target.position();
            target.set_position(Vec2::new(
                x.map_or(current.x, |x| lerp(start.x, x, progress)),
                y.map_or(current.y, |y| lerp(start.y, y, progress)),
            ));
        }
        (ActionKind::ScaleBy(_), TickerData::ScaleDelta(delta)) => {
            target.set_scale(target.scale() + *delta * progress_delta);
        }
        (ActionKind::ScaleTo { x, y }, TickerData::StartVector(start)) => {
            let current = target.scale();
            target.set_scale(Vec2::new(
                x.map_or(current.x, |x| lerp(start.x, x, progress)),
                y.map_or(current.y, |y| lerp(start.y, y, progress)),
            ));
        }
        (ActionKind::RotateBy(angle), _) => {
            target.set_rotation(target.rotation() + angle * progress_delta);
        }
        (ActionKind::RotateTo(angle), TickerData::StartScalar(start)) => {
            target.set_rotation(lerp(*start, *angle, progress));
        }
        (ActionKind::FadeAlphaBy(delta), _) => {
            target.set_alpha(target.alpha() + delta * progress_delta);
        }
        (ActionKind::FadeAlphaTo(alpha), TickerData::StartScalar(start)) => {
            target.set_alpha(lerp(*start, *alpha, progress));
        }
        (ActionKind::SpeedBy(delta), _) => {
            target.set_speed(target.speed() + delta * progress_delta);
        }
        (ActionKind::SpeedTo(speed), TickerData::StartScalar(start)) => {
            target.set_speed(lerp(*start, *speed, progress));
        }
        (ActionKind::SetVisible(visible), _) => target.set_visible(*visible),
        (ActionKind::RemoveFromParent, _) => target.remove_from_parent(),
        (ActionKind::Run(block), _) => {
            block(target)?;
            return Ok(true);
        }
        (ActionKind::Custom(step), _) => step(target, progress, delta_time)?,
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::action::Action;
    use crate::error::ActionError;
    use crate::math::Vec2;
    use crate::node::SceneNode;
    use crate::target::ActionTarget;
    use crate::ticker::ActionTicker;
    use crate::timing::TimingMode;

    fn run_to_end(node: &Rc<SceneNode>, action: Action, step: f32) -> ActionTicker {
        let target: Rc<dyn ActionTarget> = node.clone();
        let mut ticker = ActionTicker::new(Rc::downgrade(&target), action);
        for _ in 0..1000 {
            if ticker.advance(step).unwrap().is_done() {
                break;
            }
        }
        ticker
    }

    #[test]
    fn test_relative_actions_stack() {
        let node = SceneNode::root("n");
        node.set_position(Vec2::new(1.0, 1.0));
        run_to_end(&node, Action::move_by(4.0, -2.0, 0.5), 0.1);
        let pos = node.position();
        assert!((pos.x - 5.0).abs() < 1e-4);
        assert!((pos.y + 1.0).abs() < 1e-4);

        run_to_end(&node, Action::rotate_by(1.0, 0.3), 0.1);
        run_to_end(&node, Action::rotate_by(0.5, 0.3), 0.1);
        assert!((node.rotation() - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_absolute_actions() {
        let node = SceneNode::root("n");
        node.set_position(Vec2::new(3.0, 7.0));
        run_to_end(&node, Action::move_to_x(10.0, 1.0), 0.25);
        assert_eq!(node.position(), Vec2::new(10.0, 7.0));

        run_to_end(&node, Action::scale_to(2.0, 1.0), 0.25);
        assert_eq!(node.scale(), Vec2::new(2.0, 2.0));

        run_to_end(&node, Action::fade_out(0.2), 0.1);
        assert!(node.alpha().abs() < 1e-5);

        run_to_end(&node, Action::rotate_to(-1.0, 0.2), 0.1);
        assert!((node.rotation() + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_scale_by_multiplies() {
        let node = SceneNode::root("n");
        node.set_scale(Vec2::new(2.0, 4.0));
        run_to_end(&node, Action::scale_by(1.5, 1.0), 0.1);
        let scale = node.scale();
        assert!((scale.x - 3.0).abs() < 1e-4);
        assert!((scale.y - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_overshooting_curve_reaches_target() {
        let node = SceneNode::root("n");
        let target: Rc<dyn ActionTarget> = node.clone();
        let mut ticker = ActionTicker::new(
            Rc::downgrade(&target),
            Action::move_by(10.0, 0.0, 1.0).with_timing_mode(TimingMode::EaseOutBack),
        );
        let mut peak: f32 = 0.0;
        while !ticker.advance(0.05).unwrap().is_done() {
            peak = peak.max(node.position().x);
        }
        assert!(peak > 10.0);
        assert!((node.position().x - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_visibility_and_speed() {
        let root = SceneNode::root("stage");
        let node = SceneNode::child_of(&root, "n");
        run_to_end(&node, Action::hide(), 0.1);
        assert!(!node.is_visible());
        run_to_end(&node, Action::hide().reversed(), 0.1);
        assert!(node.is_visible());

        run_to_end(&node, Action::speed_to(3.0, 0.5), 0.1);
        assert!((node.speed() - 3.0).abs() < 1e-5);
        run_to_end(&node, Action::speed_by(-1.0, 0.5), 0.1);
        assert!((node.speed() - 2.0).abs() < 1e-4);

        run_to_end(&node, Action::remove_from_parent(), 0.1);
        assert!(!node.is_attached());
        assert_eq!(root.children_count(), 0);
    }

    #[test]
    fn test_custom_action_receives_progress() {
        let node = SceneNode::root("n");
        let action = Action::custom_action(1.0, |target, t, _dt| {
            target.set_alpha(1.0 - t);
            Ok(())
        });
        let target: Rc<dyn ActionTarget> = node.clone();
        let mut ticker = ActionTicker::new(Rc::downgrade(&target), action);
        ticker.advance(0.25).unwrap();
        assert!((node.alpha() - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_failing_block_propagates() {
        let node = SceneNode::root("n");
        let target: Rc<dyn ActionTarget> = node.clone();
        let mut ticker = ActionTicker::new(
            Rc::downgrade(&target),
            Action::run(|_| Err(ActionError::custom("nope"))),
        );
        assert_eq!(ticker.advance(0.1), Err(ActionError::custom("nope")));
    }
}
