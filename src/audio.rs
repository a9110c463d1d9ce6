// Looping background music, started on the first user gesture.
// Playback failures never reach the game loop.

pub const MUSIC_PATH: &str = "assets/music.mp3";

pub struct BackgroundMusic {
    started: bool,
    #[cfg(target_arch = "wasm32")]
    element: Option<web_sys::HtmlAudioElement>,
    #[cfg(not(target_arch = "wasm32"))]
    output: Option<(rodio::OutputStream, rodio::Sink)>,
}

impl BackgroundMusic {
    pub fn new() -> Self {
        Self {
            started: false,
            #[cfg(target_arch = "wasm32")]
            element: None,
            #[cfg(not(target_arch = "wasm32"))]
            output: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Start playback once; later calls are no-ops.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.start_backend();
    }

    #[cfg(target_arch = "wasm32")]
    fn start_backend(&mut self) {
        let element = match web_sys::HtmlAudioElement::new_with_src(MUSIC_PATH) {
            Ok(element) => element,
            Err(e) => {
                tracing::warn!("could not create audio element: {e:?}");
                return;
            }
        };
        element.set_loop(true);
        element.set_volume(0.5);
        match element.play() {
            Ok(promise) => {
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = wasm_bindgen_futures::JsFuture::from(promise).await {
                        tracing::warn!("music playback rejected: {e:?}");
                    }
                });
            }
            Err(e) => tracing::warn!("music playback failed: {e:?}"),
        }
        self.element = Some(element);
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start_backend(&mut self) {
        use rodio::{Decoder, OutputStreamBuilder, Sink, Source};

        let bytes = match std::fs::read(MUSIC_PATH) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("no background music at {MUSIC_PATH}: {e}");
                return;
            }
        };
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("no audio output: {e}");
                return;
            }
        };
        let source = match Decoder::new(std::io::Cursor::new(bytes)) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("could not decode {MUSIC_PATH}: {e}");
                return;
            }
        };
        let sink = Sink::connect_new(stream.mixer());
        sink.set_volume(0.5);
        sink.append(source.repeat_infinite());
        self.output = Some((stream, sink));
    }
}

impl Default for BackgroundMusic {
    fn default() -> Self {
        Self::new()
    }
}
