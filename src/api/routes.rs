use crate::platform::Platform;

/// Route set used for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformRoutes {
    /// Metadata (two-phase) or combined info (single-call) route.
    pub metadata: &'static str,
    /// Dedicated formats route; `None` when formats arrive inline.
    pub formats: Option<&'static str>,
    /// Job-creation route.
    pub download_start: &'static str,
}

impl PlatformRoutes {
    #[must_use]
    pub const fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::YouTube => Self {
                metadata: "/video-metadata",
                formats: Some("/video-formats"),
                download_start: "/download-start",
            },
            Platform::Facebook => Self::single_call("/facebook/video-info", "/facebook/download-start"),
            Platform::Twitter => Self::single_call("/twitter/video-info", "/twitter/download-start"),
            Platform::Instagram => {
                Self::single_call("/instagram/video-info", "/instagram/download-start")
            }
            Platform::TikTok => Self::single_call("/tiktok/video-info", "/tiktok/download-start"),
            Platform::Direct => Self::single_call("/direct/video-info", "/direct/download-start"),
        }
    }

    const fn single_call(info: &'static str, download_start: &'static str) -> Self {
        Self {
            metadata: info,
            formats: None,
            download_start,
        }
    }

    /// Whether formats need a second call after metadata.
    #[must_use]
    pub const fn is_two_phase(&self) -> bool {
        self.formats.is_some()
    }
}
