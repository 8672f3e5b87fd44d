//! Static knowledge store
//!
//! Maps user questions to canned informational replies by keyword. The
//! keyword table is ordered: the first topic with a matching keyword wins,
//! so specific topics (issue reports, system status) sit above broad ones
//! ("kamera").

pub mod fixtures;

use std::fmt::Write as _;

use async_trait::async_trait;

pub use fixtures::{CAMERA_POINTS, CameraPoint, CameraStatus, SystemStatus, system_status};

use crate::Result;
use crate::config::Features;
use crate::llm::{Reply, ReplySource};

/// Informational topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    ReportIssue,
    SystemStatus,
    RtspStreaming,
    CameraLocations,
    MultiplePoints,
    StreamQuality,
    RecordingAccess,
    Emergency,
    OperationalHours,
    Maintenance,
}

/// Keyword table, checked top to bottom
const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (Topic::ReportIssue, &["lapor", "laporan", "report", "rusak", "keluhan"]),
    (Topic::SystemStatus, &["status sistem", "system status", "semua kamera", "all cameras"]),
    (Topic::RtspStreaming, &["rtsp", "streaming", "stream"]),
    (Topic::CameraLocations, &["kamera", "lokasi", "titik"]),
    (Topic::MultiplePoints, &["jumlah", "berapa", "multiple"]),
    (Topic::StreamQuality, &["kualitas", "resolusi", "quality"]),
    (Topic::RecordingAccess, &["rekaman", "recording", "playback"]),
    (Topic::Emergency, &["emergency", "darurat"]),
    (Topic::OperationalHours, &["jam", "operasional"]),
    (Topic::Maintenance, &["maintenance", "perawatan"]),
];

/// Reply for questions no topic matches
const UNKNOWN_REPLY: &str = "Maaf, saya belum mengerti pertanyaan Anda. Silakan tanyakan tentang:
• 📡 RTSP streaming dan akses
• 📍 Lokasi kamera dan multiple points
• 💾 Recording dan playback
• 🎬 Kualitas video dan setting
• 🚨 Kontak emergency
• 🕐 Jam operasional";

impl Topic {
    /// Whether the widget's feature switches allow this topic
    #[must_use]
    pub const fn enabled(self, features: &Features) -> bool {
        match self {
            Self::CameraLocations => features.camera_locations,
            Self::Maintenance => features.maintenance_schedule,
            Self::Emergency => features.emergency_contacts,
            Self::ReportIssue => features.report_issues,
            Self::OperationalHours => features.operational_hours,
            Self::SystemStatus
            | Self::RtspStreaming
            | Self::MultiplePoints
            | Self::StreamQuality
            | Self::RecordingAccess => true,
        }
    }
}

/// Keyword lookup over the static reply templates
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    features: Features,
}

impl KnowledgeBase {
    /// Create a knowledge base honoring the given feature switches
    #[must_use]
    pub const fn new(features: Features) -> Self {
        Self { features }
    }

    /// Find the first enabled topic whose keywords appear in `query`
    #[must_use]
    pub fn lookup(&self, query: &str) -> Option<Topic> {
        let lower = query.to_lowercase();
        TOPIC_KEYWORDS
            .iter()
            .filter(|(topic, _)| topic.enabled(&self.features))
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(topic, _)| *topic)
    }

    /// Answer `query`, falling back to the topic menu
    #[must_use]
    pub fn respond(&self, query: &str) -> String {
        self.lookup(query)
            .map_or_else(|| UNKNOWN_REPLY.to_string(), render)
    }
}

#[async_trait]
impl ReplySource for KnowledgeBase {
    async fn reply(&self, utterance: &str, _context: &str) -> Result<Reply> {
        let topic = self.lookup(utterance);
        tracing::debug!(?topic, "knowledge lookup");
        Ok(Reply {
            text: self.respond(utterance),
            degraded: false,
        })
    }
}

/// Render the reply text for a topic
#[must_use]
pub fn render(topic: Topic) -> String {
    match topic {
        Topic::SystemStatus => render_system_status(),
        Topic::CameraLocations => render_camera_locations(),
        Topic::ReportIssue => "📝 Laporan Gangguan Kamera:

• Sebutkan ID kamera (misalnya CAM-05) dan lokasinya
• Jelaskan gangguan: gambar hilang, buram, atau offline
• Security: Ext. 101 | Maintenance: Ext. 102

Laporan ditindaklanjuti petugas dalam 1x24 jam."
            .to_string(),
        Topic::RtspStreaming => "📡 RTSP Streaming System:

🔗 Konfigurasi:
• Protocol: RTSP/TCP
• Port: 554 (default)
• Video: H.264/H.265
• Audio: AAC (opsional)

📱 Player yang kompatibel:
• VLC Media Player
• IP Cam Viewer (Mobile)
• NVR Software (Blue Iris)

🔐 Akses memerlukan autentikasi username/password dan IP whitelisting untuk akses eksternal. Hubungi admin untuk mendapatkan akses RTSP."
            .to_string(),
        Topic::MultiplePoints => render_multiple_points(),
        Topic::StreamQuality => "🎬 Pilihan Kualitas Stream:

📺 Main Stream (Recording): 1920x1080, 25 fps, 4-6 Mbps, H.264 High Profile
📱 Sub Stream (Live View): 1280x720, 15 fps, 1-2 Mbps
📲 Mobile Stream: 640x480, 10 fps, 512 kbps

⚙️ Fitur: night vision, motion detection, variable bitrate."
            .to_string(),
        Topic::RecordingAccess => "💾 Akses Rekaman:

📅 Retensi: lokal 30 hari, cloud backup 90 hari, critical events 1 tahun

🔍 Cara akses:
1. Web Interface: http://[server]:8080
2. Mobile App: \"CCTV Mobile View\"
3. Permintaan formal: admin@cctv-system.com

⚡ Export: satu kamera maks 2 jam, beberapa kamera maks 1 jam, format MP4 (H.264).

🔐 Login diperlukan untuk semua akses."
            .to_string(),
        Topic::Emergency => "🚨 Kontak Darurat:

🔴 Emergency:
• Polisi: 110
• Pemadam Kebakaran: 113
• Ambulans: 118

🏢 Internal:
• Control Room: Ext. 100
• Security: Ext. 101
• Maintenance: Ext. 102"
            .to_string(),
        Topic::OperationalHours => "🕐 Jam Operasional:

📹 Sistem CCTV:
• Monitoring: 24/7
• Live viewing: 24/7
• Akses rekaman: 06:00 - 22:00

🏢 Control Room:
• Senin-Jumat: 08:00 - 17:00
• Sabtu: 08:00 - 12:00
• Minggu: On-call emergency"
            .to_string(),
        Topic::Maintenance => render_maintenance(),
    }
}

fn render_system_status() -> String {
    let status = system_status();
    let mut out = String::from("📹 Status Sistem CCTV:\n\n");
    let _ = writeln!(
        out,
        "• Server: {}",
        if status.server_online { "online" } else { "offline" }
    );
    let _ = writeln!(
        out,
        "• Kamera online: {}/{}",
        status.online_cameras, status.total_cameras
    );
    let _ = writeln!(
        out,
        "• Storage: {} / {} ({}%)",
        status.storage_used, status.storage_total, status.storage_percent
    );
    let _ = writeln!(
        out,
        "• Jaringan: {} ({})",
        if status.network_stable { "stabil" } else { "tidak stabil" },
        status.bandwidth
    );
    let _ = write!(out, "• Peringatan aktif: {}", status.alerts);
    out
}

fn render_camera_locations() -> String {
    let mut out = String::from("📍 Lokasi Kamera CCTV:\n");
    for camera in CAMERA_POINTS {
        let _ = write!(
            out,
            "\n• {} {} ({}) - {}",
            camera.id,
            camera.name,
            camera.location,
            camera.status.label()
        );
    }
    out.push_str("\n\nUntuk informasi detail lokasi, hubungi petugas keamanan.");
    out
}

fn render_multiple_points() -> String {
    let mut out = format!(
        "📊 Multiple Camera Points:\n\n🎯 Total: {} kamera terpasang",
        CAMERA_POINTS.len()
    );
    let mut floors: Vec<i32> = CAMERA_POINTS.iter().map(|c| c.floor).collect();
    floors.sort_unstable();
    floors.dedup();
    for floor in floors {
        let ids: Vec<&str> = fixtures::cameras_on_floor(floor).map(|c| c.id).collect();
        let _ = write!(out, "\n• Lantai {floor}: {} ({})", ids.len(), ids.join(", "));
    }
    let recording = CAMERA_POINTS.iter().filter(|c| c.recording).count();
    let _ = write!(out, "\n\n💾 Recording aktif: {recording} kamera");
    out
}

fn render_maintenance() -> String {
    let mut out = String::from(
        "🔧 Jadwal Maintenance:

📋 Rutin mingguan:
• Senin: Pembersihan lensa
• Rabu: Pengecekan koneksi
• Jumat: Update software",
    );
    let under: Vec<&CameraPoint> = fixtures::cameras_with_status(CameraStatus::Maintenance).collect();
    if !under.is_empty() {
        out.push_str("\n\n🛠️ Sedang maintenance:");
        for camera in under {
            let _ = write!(
                out,
                "\n• {} {} (selesai {})",
                camera.id, camera.location, camera.next_maintenance
            );
        }
    }
    out.push_str("\n\n⚠️ Selama maintenance, beberapa kamera sementara offline.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_topic_wins() {
        let kb = KnowledgeBase::default();
        assert_eq!(kb.lookup("Bagaimana akses RTSP stream?"), Some(Topic::RtspStreaming));
        assert_eq!(kb.lookup("lokasi kamera di mana"), Some(Topic::CameraLocations));
        assert_eq!(kb.lookup("Saya mau lapor kamera rusak"), Some(Topic::ReportIssue));
        assert_eq!(kb.lookup("NOMOR DARURAT"), Some(Topic::Emergency));
        assert_eq!(kb.lookup("cuaca hari ini"), None);
    }

    #[test]
    fn disabled_features_fall_through() {
        let features = Features {
            emergency_contacts: false,
            ..Features::default()
        };
        let kb = KnowledgeBase::new(features);
        assert_eq!(kb.lookup("kontak darurat"), None);
        assert!(kb.respond("kontak darurat").starts_with("Maaf"));
    }

    #[test]
    fn camera_locations_list_every_fixture() {
        let text = render(Topic::CameraLocations);
        for camera in CAMERA_POINTS {
            assert!(text.contains(camera.id), "{} missing", camera.id);
        }
    }

    #[test]
    fn maintenance_mentions_cameras_under_maintenance() {
        let text = render(Topic::Maintenance);
        assert!(text.contains("CAM-06"));
        assert!(!text.contains("CAM-01"));
    }

    #[test]
    fn status_reflects_fixtures() {
        let text = render(Topic::SystemStatus);
        assert!(text.contains("7/8"));
    }

    #[tokio::test]
    async fn reply_source_never_degrades() {
        let kb = KnowledgeBase::default();
        let reply = kb.reply("jam operasional?", "").await.unwrap();
        assert!(!reply.degraded);
        assert!(reply.text.contains("Jam Operasional"));
    }
}
