//! The viewer region: the part of the window that hosts either a
//! placeholder message or the active viewer session.

use std::sync::Arc;

use asset::Model;

use crate::session::{SessionId, ViewerSession, ViewerSettings};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    Loading,
    Error,
}

impl Placeholder {
    pub fn message(self) -> &'static str {
        match self {
            Placeholder::Loading => "Loading 3D model...",
            Placeholder::Error => "Could not load the model.",
        }
    }
}

enum RegionContent {
    Empty,
    Placeholder(Placeholder),
    Session(ViewerSession),
}

pub struct ViewerRegion {
    settings: ViewerSettings,
    size: [u32; 2],
    content: RegionContent,
    next_session: u64,
}

impl ViewerRegion {
    pub fn new(settings: ViewerSettings) -> Self {
        Self {
            settings,
            size: [1, 1],
            content: RegionContent::Empty,
            next_session: 1,
        }
    }

    #[inline]
    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// Track the on-screen size (physical pixels); forwarded to the session.
    pub fn set_size(&mut self, width: u32, height: u32) {
        let size = [width.max(1), height.max(1)];
        if size == self.size {
            return;
        }
        self.size = size;
        if let RegionContent::Session(session) = &mut self.content {
            session.resize(size[0], size[1]);
        }
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        match self.content {
            RegionContent::Placeholder(p) => Some(p),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&ViewerSession> {
        match &self.content {
            RegionContent::Session(s) => Some(s),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut ViewerSession> {
        match &mut self.content {
            RegionContent::Session(s) => Some(s),
            _ => None,
        }
    }

    /// `true` while a session needs continuous redraws.
    pub fn is_animating(&self) -> bool {
        self.session().is_some_and(ViewerSession::is_running)
    }

    /// Empty the region. A session that was showing is stopped and handed back.
    pub fn clear(&mut self) -> Option<ViewerSession> {
        match std::mem::replace(&mut self.content, RegionContent::Empty) {
            RegionContent::Session(mut old) => {
                old.stop();
                Some(old)
            }
            _ => None,
        }
    }

    pub fn show_placeholder(&mut self, placeholder: Placeholder) {
        self.clear();
        self.content = RegionContent::Placeholder(placeholder);
    }

    /// Replace whatever is showing with a fresh session for `model`.
    pub fn present(&mut self, model: &Arc<Model>) -> SessionId {
        self.clear();
        let id = SessionId(self.next_session);
        self.next_session += 1;
        let session = ViewerSession::new(id, model, &self.settings, self.size);
        self.content = RegionContent::Session(session);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::model;

    fn region() -> ViewerRegion {
        let mut r = ViewerRegion::new(ViewerSettings::default());
        r.set_size(640, 480);
        r
    }

    #[test]
    fn present_twice_leaves_one_session() {
        let mut r = region();
        let m = model();
        let first = r.present(&m);
        let second = r.present(&m);
        assert_ne!(first, second);
        let s = r.session().expect("session");
        assert_eq!(s.id(), second);
        assert!(s.is_running());
        assert!(r.placeholder().is_none());
    }

    #[test]
    fn replaced_session_is_stopped() {
        let mut r = region();
        let m = model();
        r.present(&m);
        let old = r.clear().expect("previous session");
        assert!(!old.is_running());
        assert!(!r.is_animating());
        assert!(r.clear().is_none());
    }

    #[test]
    fn placeholder_replaces_session() {
        let mut r = region();
        r.present(&model());
        r.show_placeholder(Placeholder::Error);
        assert!(r.session().is_none());
        assert_eq!(r.placeholder(), Some(Placeholder::Error));
        assert!(!r.is_animating());
    }

    #[test]
    fn session_follows_region_size() {
        let mut r = region();
        r.present(&model());
        assert_eq!(r.session().unwrap().size(), [640, 480]);
        r.set_size(300, 0);
        assert_eq!(r.size(), [300, 1]);
        assert_eq!(r.session().unwrap().size(), [300, 1]);
    }
}
