use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to access state file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("state field '{field}' has malformed value '{token}'")]
    Malformed { field: &'static str, token: String },
    #[error("state file ends before field '{field}'")]
    Truncated { field: &'static str },
}

/// Values that survive a restart: 17 scalars, one per line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramState {
    pub clear_color: [f32; 3],
    pub overlay_enabled: bool,
    pub camera_position: [f32; 3],
    pub camera_front: [f32; 3],
    pub object_position: [f32; 3],
    pub object_scale: f32,
    /// (constant, linear, quadratic)
    pub point_attenuation: [f32; 3],
}

impl Default for ProgramState {
    fn default() -> Self {
        Self {
            clear_color: [0.0; 3],
            overlay_enabled: false,
            camera_position: [0.0, 0.0, 3.0],
            camera_front: [0.0, 0.0, -1.0],
            object_position: [0.0; 3],
            object_scale: 1.0,
            point_attenuation: [1.0, 0.09, 0.032],
        }
    }
}

const FIELD_NAMES: [&str; 17] = [
    "clear_color.r",
    "clear_color.g",
    "clear_color.b",
    "overlay_enabled",
    "camera_position.x",
    "camera_position.y",
    "camera_position.z",
    "camera_front.x",
    "camera_front.y",
    "camera_front.z",
    "object_position.x",
    "object_position.y",
    "object_position.z",
    "object_scale",
    "point_attenuation.constant",
    "point_attenuation.linear",
    "point_attenuation.quadratic",
];

/// Mutable view of one persisted scalar.
enum Slot<'a> {
    Float(&'a mut f32),
    Flag(&'a mut bool),
}

impl ProgramState {
    /// Reads the state file. A missing file yields defaults without comment;
    /// a malformed or short file keeps everything parsed before the problem
    /// and defaults for the rest.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(source) => {
                let err = StateError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                warn!("{}. Using defaults.", err);
                return Self::default();
            }
        };

        let mut state = Self::default();
        match state.apply_text(&text) {
            Ok(()) => info!("Loaded program state from {}", path.display()),
            Err(e) => warn!("{} in {}. Remaining fields keep their defaults.", e, path.display()),
        }
        state
    }

    /// Written at normal shutdown only.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StateError> {
        let path = path.as_ref();
        fs::write(path, self.to_text()).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overwrites fields in file order until the text runs out or a token
    /// fails to parse.
    pub fn apply_text(&mut self, text: &str) -> Result<(), StateError> {
        let mut tokens = text.split_whitespace();

        for (slot, field) in self.slots().into_iter().zip(FIELD_NAMES) {
            let token = tokens.next().ok_or(StateError::Truncated { field })?;
            let malformed = || StateError::Malformed {
                field,
                token: token.to_string(),
            };
            match slot {
                Slot::Float(v) => *v = token.parse().map_err(|_| malformed())?,
                Slot::Flag(v) => {
                    *v = match token {
                        "0" => false,
                        "1" => true,
                        _ => return Err(malformed()),
                    }
                }
            }
        }
        Ok(())
    }

    /// One value per line. Floats use the shortest text that parses back to
    /// the same bits.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let mut copy = self.clone();
        for slot in copy.slots() {
            let line = match slot {
                Slot::Float(v) => v.to_string(),
                Slot::Flag(v) => u8::from(*v).to_string(),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    fn slots(&mut self) -> Vec<Slot<'_>> {
        let [r, g, b] = &mut self.clear_color;
        let [px, py, pz] = &mut self.camera_position;
        let [fx, fy, fz] = &mut self.camera_front;
        let [ox, oy, oz] = &mut self.object_position;
        let [c, l, q] = &mut self.point_attenuation;

        vec![
            Slot::Float(r),
            Slot::Float(g),
            Slot::Float(b),
            Slot::Flag(&mut self.overlay_enabled),
            Slot::Float(px),
            Slot::Float(py),
            Slot::Float(pz),
            Slot::Float(fx),
            Slot::Float(fy),
            Slot::Float(fz),
            Slot::Float(ox),
            Slot::Float(oy),
            Slot::Float(oz),
            Slot::Float(&mut self.object_scale),
            Slot::Float(c),
            Slot::Float(l),
            Slot::Float(q),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn awkward_state() -> ProgramState {
        ProgramState {
            clear_color: [0.1, 0.2, 1.0 / 3.0],
            overlay_enabled: true,
            camera_position: [-3.75, 1.0e-7, 12345.678],
            camera_front: [0.577_350_26, -0.577_350_26, f32::MIN_POSITIVE],
            object_position: [-0.0, 7.0, f32::MAX],
            object_scale: 0.009,
            point_attenuation: [1.0, 0.09, 0.032],
        }
    }

    #[test]
    fn round_trip_is_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("program_state.txt");
        let state = awkward_state();
        state.save(&path).unwrap();

        let loaded = ProgramState::load(&path);
        let bits = |s: &ProgramState| {
            let mut s = s.clone();
            s.slots()
                .into_iter()
                .map(|slot| match slot {
                    Slot::Float(v) => v.to_bits(),
                    Slot::Flag(v) => u32::from(*v),
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(bits(&loaded), bits(&state));
    }

    #[test]
    fn file_has_seventeen_lines() {
        let text = awkward_state().to_text();
        assert_eq!(text.lines().count(), 17);
        assert_eq!(text.lines().nth(3), Some("1"));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ProgramState::load(dir.path().join("absent.txt")), ProgramState::default());
    }

    #[test]
    fn malformed_token_stops_parsing() {
        let mut state = ProgramState::default();
        let err = state.apply_text("0.5 0.5 0.5 1 9 abc 4").unwrap_err();
        assert!(matches!(err, StateError::Malformed { field: "camera_position.y", .. }));

        assert_eq!(state.clear_color, [0.5; 3]);
        assert!(state.overlay_enabled);
        assert_eq!(state.camera_position, [9.0, 0.0, 3.0]);
        assert_eq!(state.object_scale, 1.0);
    }

    #[test]
    fn overlay_flag_accepts_only_zero_or_one() {
        let mut state = ProgramState::default();
        let err = state.apply_text("0 0 0 true").unwrap_err();
        assert!(matches!(err, StateError::Malformed { field: "overlay_enabled", .. }));
        assert!(!state.overlay_enabled);
    }

    #[test]
    fn short_file_is_truncated() {
        let mut state = ProgramState::default();
        let err = state.apply_text("0.25\n0.5\n").unwrap_err();
        assert!(matches!(err, StateError::Truncated { field: "clear_color.b" }));
        assert_eq!(state.clear_color, [0.25, 0.5, 0.0]);
    }
}
