use crate::engine::assets::robot_model::RobotModel;
use crate::engine::core::session::EditSession;
use crate::engine::map::raster_editor::point_in_polygon;
use crate::tools::map_tool::MapTool;
use crate::tools::pose::visuals::{PoseEstimate, PoseVisuals};
use crate::tools::records::{PoseRecord, ToolCommit};
use crate::tools::settings::PoseSettings;
use bevy::prelude::*;
use std::sync::Arc;

/// Drag state of the pose overlay. A press on the footprint pans, a press
/// anywhere else rotates about the current position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PoseToolState {
    #[default]
    Select,
    Pan {
        drag_start_world: Vec2,
        drag_start_position: Vec3,
    },
    Rotate {
        center: Vec2,
        start_angle: f32,
        start_yaw: f32,
    },
}

fn angle_about(center: Vec2, world: Vec2) -> f32 {
    let offset = world - center;
    offset.y.atan2(offset.x)
}

#[derive(Resource)]
pub struct PoseEstimateTool {
    enabled: bool,
    session: Arc<EditSession>,
    pose: PoseEstimate,
    snapshot: Option<PoseEstimate>,
    state: PoseToolState,
    visuals: Option<PoseVisuals>,
    /// Seconds since the session started, advanced by the app clock.
    elapsed: f64,
    visuals_dirty: bool,
}

impl PoseEstimateTool {
    pub fn new(session: Arc<EditSession>, settings: PoseSettings) -> Self {
        let [x, y, yaw] = settings.initial_pose;
        Self {
            enabled: false,
            session,
            pose: PoseEstimate::from_planar(x, y, yaw),
            snapshot: None,
            state: PoseToolState::Select,
            visuals: None,
            elapsed: 0.0,
            visuals_dirty: false,
        }
    }

    pub fn pose(&self) -> &PoseEstimate {
        &self.pose
    }

    pub fn state(&self) -> PoseToolState {
        self.state
    }

    pub fn visuals(&self) -> Option<&PoseVisuals> {
        self.visuals.as_ref()
    }

    pub fn set_elapsed(&mut self, elapsed: f64) {
        self.elapsed = elapsed;
    }

    pub fn take_visuals_dirty(&mut self) -> bool {
        std::mem::take(&mut self.visuals_dirty)
    }

    /// Re-derive the overlay geometry, e.g. after the sensor cloud changed.
    pub fn refresh(&mut self, robot: &RobotModel) {
        self.visuals = robot
            .has_footprint()
            .then(|| PoseVisuals::derive(&self.pose, robot));
        self.visuals_dirty = true;
    }

    fn hits_footprint(&self, world: Vec2) -> bool {
        self.visuals
            .as_ref()
            .is_some_and(|visuals| point_in_polygon(world, &visuals.footprint))
    }
}

impl MapTool for PoseEstimateTool {
    type Target = RobotModel;

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn enable(&mut self, robot: &mut RobotModel) {
        self.snapshot = Some(self.pose);
        self.state = PoseToolState::Select;
        self.enabled = true;
        self.refresh(robot);
        info!(
            "Pose estimate tool enabled at ({:.2}, {:.2}, yaw {:.2})",
            self.pose.position.x,
            self.pose.position.y,
            self.pose.yaw()
        );
    }

    fn disable(&mut self, robot: &mut RobotModel) {
        self.cancel(robot);
        self.snapshot = None;
        self.enabled = false;
        self.visuals_dirty = true;
    }

    fn pointer_down(&mut self, robot: &mut RobotModel, world: Vec2) {
        if !robot.has_footprint() {
            debug!("Pose estimate ignored: robot footprint unavailable");
            return;
        }

        self.state = if self.hits_footprint(world) {
            PoseToolState::Pan {
                drag_start_world: world,
                drag_start_position: self.pose.position,
            }
        } else {
            let center = self.pose.position.truncate();
            PoseToolState::Rotate {
                center,
                start_angle: angle_about(center, world),
                start_yaw: self.pose.yaw(),
            }
        };
        debug!("Pose tool state: {:?}", self.state);
    }

    fn pointer_move(&mut self, robot: &mut RobotModel, world: Vec2) {
        match self.state {
            PoseToolState::Select => return,
            PoseToolState::Pan {
                drag_start_world,
                drag_start_position,
            } => {
                self.pose.position = drag_start_position + (world - drag_start_world).extend(0.0);
            }
            PoseToolState::Rotate {
                center,
                start_angle,
                start_yaw,
            } => {
                let yaw = start_yaw + angle_about(center, world) - start_angle;
                self.pose.orientation = Quat::from_axis_angle(Vec3::Z, yaw).normalize();
            }
        }
        self.refresh(robot);
    }

    fn pointer_up(&mut self, _robot: &mut RobotModel) {
        self.state = PoseToolState::Select;
    }

    fn apply(&mut self, robot: &mut RobotModel) -> Option<ToolCommit> {
        if !robot.has_footprint() {
            return None;
        }

        self.pose.timestamp = self.session.timestamp(self.elapsed);
        self.snapshot = Some(self.pose);
        self.state = PoseToolState::Select;

        let record = PoseRecord {
            map_id: self.session.map_id.clone(),
            site_id: self.session.site_id.clone(),
            position: self.pose.position.to_array(),
            orientation: self.pose.orientation.to_array(),
            timestamp: self.pose.timestamp,
        };
        info!(
            "Committed pose estimate ({:.2}, {:.2}, yaw {:.3})",
            record.position[0],
            record.position[1],
            self.pose.yaw()
        );
        Some(ToolCommit::PoseEstimate(record))
    }

    fn cancel(&mut self, robot: &mut RobotModel) {
        if let Some(snapshot) = self.snapshot {
            self.pose = snapshot;
        }
        self.state = PoseToolState::Select;
        self.refresh(robot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn robot() -> RobotModel {
        RobotModel {
            footprint: vec![
                Vec2::new(-0.3, -0.2),
                Vec2::new(0.3, -0.2),
                Vec2::new(0.3, 0.2),
                Vec2::new(-0.3, 0.2),
            ],
            ..default()
        }
    }

    fn tool(robot: &mut RobotModel) -> PoseEstimateTool {
        let session = Arc::new(EditSession::starting_at("map-1", "site-1", 1_000.0));
        let mut tool = PoseEstimateTool::new(session, PoseSettings::default());
        tool.enable(robot);
        tool
    }

    #[test]
    fn press_on_the_footprint_pans_without_rotating() {
        let mut robot = robot();
        let mut tool = tool(&mut robot);

        tool.pointer_down(&mut robot, Vec2::new(0.1, 0.0));
        assert!(matches!(tool.state(), PoseToolState::Pan { .. }));
        tool.pointer_move(&mut robot, Vec2::new(1.1, 2.0));
        tool.pointer_up(&mut robot);

        assert_eq!(tool.pose().position, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(tool.pose().orientation, Quat::IDENTITY);
        assert_eq!(tool.state(), PoseToolState::Select);
    }

    #[test]
    fn press_off_the_footprint_rotates_in_place() {
        let mut robot = robot();
        let mut tool = tool(&mut robot);

        tool.pointer_down(&mut robot, Vec2::new(1.0, 0.0));
        tool.pointer_move(&mut robot, Vec2::new(0.0, 1.0));

        assert!((tool.pose().yaw() - FRAC_PI_2).abs() < 1e-3);
        assert_eq!(tool.pose().position, Vec3::ZERO);
        assert!((tool.pose().orientation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cancel_restores_the_activation_pose() {
        let mut robot = robot();
        let mut tool = tool(&mut robot);
        let initial = *tool.pose();

        tool.pointer_down(&mut robot, Vec2::ZERO);
        tool.pointer_move(&mut robot, Vec2::new(3.0, 3.0));
        tool.pointer_up(&mut robot);
        tool.cancel(&mut robot);

        assert_eq!(*tool.pose(), initial);
        assert_eq!(
            tool.visuals().map(|v| v.footprint.clone()),
            Some(robot.footprint.clone())
        );
    }

    #[test]
    fn apply_stamps_wall_clock_time() {
        let mut robot = robot();
        let mut tool = tool(&mut robot);
        tool.set_elapsed(2.5);

        let Some(ToolCommit::PoseEstimate(record)) = tool.apply(&mut robot) else {
            panic!("expected a pose commit");
        };
        assert_eq!(record.timestamp, 1_002.5);
        assert_eq!(record.orientation, [0.0, 0.0, 0.0, 1.0]);

        // The committed pose is the new rollback point.
        tool.pointer_down(&mut robot, Vec2::ZERO);
        tool.pointer_move(&mut robot, Vec2::new(1.0, 0.0));
        tool.cancel(&mut robot);
        assert_eq!(tool.pose().timestamp, 1_002.5);
        assert_eq!(tool.pose().position, Vec3::ZERO);
    }

    #[test]
    fn tool_is_inert_without_a_footprint() {
        let mut robot = RobotModel::default();
        let mut tool = tool(&mut robot);

        tool.pointer_down(&mut robot, Vec2::new(1.0, 0.0));
        tool.pointer_move(&mut robot, Vec2::new(0.0, 1.0));

        assert_eq!(tool.state(), PoseToolState::Select);
        assert_eq!(tool.pose().orientation, Quat::IDENTITY);
        assert!(tool.visuals().is_none());
        assert!(tool.apply(&mut robot).is_none());
    }
}
