//! Static camera and system-status fixtures
//!
//! Illustrative data only. Nothing here talks to a camera.

use serde::Serialize;

/// Mounting/form factor of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    Indoor,
    Outdoor,
    Ptz,
    Dome,
    Bullet,
}

/// Operational state of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraStatus {
    Online,
    Offline,
    Maintenance,
    Error,
}

impl CameraStatus {
    /// Indonesian label used in replies
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Maintenance => "maintenance",
            Self::Error => "error",
        }
    }
}

/// A single camera installation point
#[derive(Debug, Clone, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct CameraPoint {
    pub id: &'static str,
    pub name: &'static str,
    pub location: &'static str,
    pub kind: CameraKind,
    pub status: CameraStatus,
    pub resolution: &'static str,
    pub fps: u32,
    pub recording: bool,
    pub night_vision: bool,
    pub motion_detection: bool,
    pub audio_enabled: bool,
    pub zone: &'static str,
    pub floor: i32,
    pub next_maintenance: &'static str,
    pub codec: &'static str,
}

/// Installed cameras
pub const CAMERA_POINTS: &[CameraPoint] = &[
    CameraPoint {
        id: "CAM-01",
        name: "Main Entrance",
        location: "Pintu Masuk Utama",
        kind: CameraKind::Outdoor,
        status: CameraStatus::Online,
        resolution: "1920x1080",
        fps: 25,
        recording: true,
        night_vision: true,
        motion_detection: true,
        audio_enabled: true,
        zone: "Entrance",
        floor: 1,
        next_maintenance: "2024-02-15",
        codec: "H.264",
    },
    CameraPoint {
        id: "CAM-02",
        name: "Parking Area North",
        location: "Area Parkir Utara",
        kind: CameraKind::Outdoor,
        status: CameraStatus::Online,
        resolution: "1920x1080",
        fps: 25,
        recording: true,
        night_vision: true,
        motion_detection: true,
        audio_enabled: false,
        zone: "Parking",
        floor: 0,
        next_maintenance: "2024-02-10",
        codec: "H.264",
    },
    CameraPoint {
        id: "CAM-03",
        name: "Parking Area South",
        location: "Area Parkir Selatan",
        kind: CameraKind::Outdoor,
        status: CameraStatus::Online,
        resolution: "1920x1080",
        fps: 25,
        recording: true,
        night_vision: true,
        motion_detection: true,
        audio_enabled: false,
        zone: "Parking",
        floor: 0,
        next_maintenance: "2024-02-10",
        codec: "H.264",
    },
    CameraPoint {
        id: "CAM-04",
        name: "Lobby Reception",
        location: "Lobby & Resepsionis",
        kind: CameraKind::Indoor,
        status: CameraStatus::Online,
        resolution: "1920x1080",
        fps: 30,
        recording: true,
        night_vision: false,
        motion_detection: true,
        audio_enabled: true,
        zone: "Lobby",
        floor: 1,
        next_maintenance: "2024-02-08",
        codec: "H.264",
    },
    CameraPoint {
        id: "CAM-05",
        name: "Corridor Floor 1",
        location: "Koridor Lantai 1",
        kind: CameraKind::Dome,
        status: CameraStatus::Online,
        resolution: "1280x720",
        fps: 25,
        recording: true,
        night_vision: false,
        motion_detection: true,
        audio_enabled: false,
        zone: "Corridor",
        floor: 1,
        next_maintenance: "2024-02-12",
        codec: "H.264",
    },
    CameraPoint {
        id: "CAM-06",
        name: "Emergency Exit East",
        location: "Pintu Darurat Timur",
        kind: CameraKind::Bullet,
        status: CameraStatus::Maintenance,
        resolution: "1280x720",
        fps: 25,
        recording: false,
        night_vision: false,
        motion_detection: true,
        audio_enabled: false,
        zone: "Emergency",
        floor: 1,
        next_maintenance: "2024-01-25",
        codec: "H.264",
    },
    CameraPoint {
        id: "CAM-07",
        name: "Server Room",
        location: "Ruang Server",
        kind: CameraKind::Ptz,
        status: CameraStatus::Online,
        resolution: "1920x1080",
        fps: 30,
        recording: true,
        night_vision: false,
        motion_detection: true,
        audio_enabled: true,
        zone: "Critical",
        floor: 2,
        next_maintenance: "2024-02-05",
        codec: "H.265",
    },
    CameraPoint {
        id: "CAM-08",
        name: "Security Office",
        location: "Kantor Keamanan",
        kind: CameraKind::Indoor,
        status: CameraStatus::Online,
        resolution: "1920x1080",
        fps: 25,
        recording: true,
        night_vision: false,
        motion_detection: true,
        audio_enabled: true,
        zone: "Security",
        floor: 1,
        next_maintenance: "2024-02-15",
        codec: "H.264",
    },
];

/// Overall recorder/network health snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemStatus {
    pub server_online: bool,
    pub total_cameras: usize,
    pub online_cameras: usize,
    pub recording: bool,
    pub storage_used: &'static str,
    pub storage_total: &'static str,
    pub storage_percent: u8,
    pub network_stable: bool,
    pub bandwidth: &'static str,
    pub alerts: usize,
}

/// Derive the status snapshot from the camera fixtures
#[must_use]
pub fn system_status() -> SystemStatus {
    let online = cameras_with_status(CameraStatus::Online).count();
    SystemStatus {
        server_online: true,
        total_cameras: CAMERA_POINTS.len(),
        online_cameras: online,
        recording: true,
        storage_used: "6.8TB",
        storage_total: "10TB",
        storage_percent: 68,
        network_stable: true,
        bandwidth: "42/100 Mbps",
        alerts: CAMERA_POINTS.len() - online,
    }
}

/// Cameras in a given state
pub fn cameras_with_status(status: CameraStatus) -> impl Iterator<Item = &'static CameraPoint> {
    CAMERA_POINTS.iter().filter(move |c| c.status == status)
}

/// Cameras on a floor
pub fn cameras_on_floor(floor: i32) -> impl Iterator<Item = &'static CameraPoint> {
    CAMERA_POINTS.iter().filter(move |c| c.floor == floor)
}

/// Cameras whose name, location or zone mention `keyword`
#[must_use]
pub fn search_cameras(keyword: &str) -> Vec<&'static CameraPoint> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    CAMERA_POINTS
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&needle)
                || c.location.to_lowercase().contains(&needle)
                || c.zone.to_lowercase().contains(&needle)
        })
        .collect()
}
