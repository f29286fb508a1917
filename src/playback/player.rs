//! External player invocation.
//!
//! [`PlayerCommand`] turns a track into a ready-to-spawn command. The
//! supervisor owns stdio wiring and process lifetime; implementations only
//! decide program, arguments, and environment.

use tokio::process::Command;

use crate::config::{PlayerConfig, ResolverConfig};
use crate::models::track::Track;

/// Builds the external command that plays one track.
pub trait PlayerCommand: Send + Sync {
    /// Program name used in log output.
    fn program(&self) -> &str;

    /// Command that plays `track` to completion and exits 0 on success.
    fn command(&self, track: &Track) -> Command;
}

/// `mpv` with the fixed audio-only option set.
#[derive(Debug, Clone)]
pub struct MpvCommand {
    player: PlayerConfig,
    ytdlp_path: String,
}

impl MpvCommand {
    /// Construct from the player and resolver configuration sections.
    #[must_use]
    pub fn new(player: &PlayerConfig, resolver: &ResolverConfig) -> Self {
        Self {
            player: player.clone(),
            ytdlp_path: resolver.ytdlp_path.clone(),
        }
    }

    /// Full argument list for `track`, source reference first.
    #[must_use]
    pub fn args(&self, track: &Track) -> Vec<String> {
        let mut args = vec![
            format!("ytdl://{}", track.id),
            "--no-video".to_owned(),
            format!("--volume={}", self.player.volume),
            format!("--script-opts=ytdl_path={}", self.ytdlp_path),
            "--ytdl-format=bestaudio[ext=m4a]/bestaudio".to_owned(),
            // Bounded network and read-ahead buffering.
            "--force-seekable=yes".to_owned(),
            "--cache=yes".to_owned(),
            "--cache-secs=120".to_owned(),
            "--demuxer-max-bytes=1024M".to_owned(),
            "--demuxer-readahead-secs=60".to_owned(),
            "--network-timeout=120".to_owned(),
            "--stream-buffer-size=4M".to_owned(),
            "--demuxer-thread=yes".to_owned(),
            "--audio-buffer=0.5".to_owned(),
            "--audio-pitch-correction=no".to_owned(),
            "--gapless-audio=yes".to_owned(),
            "--audio-samplerate=48000".to_owned(),
            // No interactive terminal control; keep a parseable status line.
            "--input-terminal=no".to_owned(),
            "--term-status-msg=AV: ${time-pos} / ${duration}".to_owned(),
        ];

        if let Some(device) = self.player.audio_device.as_deref().filter(|d| !d.is_empty()) {
            args.push(format!("--audio-device={device}"));
        }

        args.extend(self.player.extra_args.iter().cloned());
        args
    }
}

impl PlayerCommand for MpvCommand {
    fn program(&self) -> &str {
        &self.player.path
    }

    fn command(&self, track: &Track) -> Command {
        let mut cmd = Command::new(&self.player.path);
        cmd.args(self.args(track)).envs(&self.player.env);
        cmd
    }
}
