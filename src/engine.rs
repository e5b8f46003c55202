//! DSP-context orchestration.
//!
//! One `Engine` owns the whole receive chain for the active mode: ingest →
//! spectrum → tone cache → decoder, plus the PPS state machine and the
//! transmit key stream. Everything it tells the outside world goes through
//! the dispatch queue; the host drives it with sample frames, PPS edges and
//! the TX symbol timer.

use crossbeam::channel::Receiver;
use tracing::{debug, trace};

use crate::beacon::{tone_detect, BeaconDecoder, BeaconMode, BeaconOutcome};
use crate::constants::{ModeParams, OOK48_HALF_RATE_CACHE};
use crate::dispatch::{BeaconReport, Dispatcher, Event, WaterfallScaler};
use crate::morse::keyer::KeySegment;
use crate::morse::{alignment_dashes, key_text, MorseDecoder, MorseEvent};
use crate::ook48::{compile_message, KeyStream, Ook48Decoder, Ook48Outcome};
use crate::settings::{AppMode, Settings};
use crate::spectrum::SpectrumEngine;
use crate::timing::{FrameAction, SymbolTiming};
use crate::tone_cache::{ToneCache, NO_LABEL};

enum ModeRuntime {
    Ook48(Ook48Decoder),
    Beacon(BeaconDecoder),
    Morse(MorseDecoder),
}

pub struct Engine {
    params: &'static ModeParams,
    settings: Settings,
    spectrum: SpectrumEngine,
    cache: ToneCache,
    timing: SymbolTiming,
    dispatcher: Dispatcher,
    waterfall: WaterfallScaler,
    mode: ModeRuntime,
    magnitudes: Vec<f32>,
    morse_events: Vec<MorseEvent>,
    key_stream: Option<KeyStream>,
    transmitting: bool,
    locator: String,
    clock: (u8, u8),
}

impl Engine {
    /// Build an engine for the mode selected in `settings`; the returned
    /// receiver is the dispatch-context end of the event queue.
    pub fn new(settings: Settings) -> (Engine, Receiver<Event>) {
        let params = settings.app.params();
        let (dispatcher, receiver) = Dispatcher::new();

        let (capacity, target) = match settings.app {
            AppMode::Ook48 => (
                OOK48_HALF_RATE_CACHE,
                if settings.half_rate {
                    OOK48_HALF_RATE_CACHE
                } else {
                    params.cache_size
                },
            ),
            AppMode::Jt4 | AppMode::Pi4 => (params.cache_size, params.cache_size),
            AppMode::Morse => (1, 1),
        };
        let mut cache = ToneCache::new(params.num_bins, capacity);
        cache.set_target(target);

        let mode = match settings.app {
            AppMode::Ook48 => ModeRuntime::Ook48(Ook48Decoder::new(
                settings.decode_mode,
                settings.confidence_threshold,
                settings.half_rate,
                params.tone0,
                params.tone_tolerance,
            )),
            AppMode::Jt4 => ModeRuntime::Beacon(BeaconDecoder::new(BeaconMode::Jt4)),
            AppMode::Pi4 => ModeRuntime::Beacon(BeaconDecoder::new(BeaconMode::Pi4)),
            AppMode::Morse => ModeRuntime::Morse(MorseDecoder::new(params.frame_rate())),
        };

        let engine = Engine {
            params,
            spectrum: SpectrumEngine::new(params),
            cache,
            timing: SymbolTiming::new(params.frame_period_ms()),
            dispatcher,
            waterfall: WaterfallScaler::new(),
            mode,
            magnitudes: Vec::with_capacity(params.num_bins),
            morse_events: Vec::new(),
            key_stream: None,
            transmitting: false,
            locator: String::new(),
            clock: (0, 0),
            settings,
        };
        (engine, receiver)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn audio_level(&self) -> u8 {
        self.spectrum.audio_level()
    }

    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    /// Current cache write index; test and telemetry visibility.
    pub fn write_slot(&self) -> usize {
        self.cache.write_slot()
    }

    /// Station locator used for the 0x86 message token.
    pub fn set_locator(&mut self, locator: &str) {
        self.locator = locator.to_string();
    }

    /// GPS 1PPS edge with the fix time it announces.
    pub fn on_pps(&mut self, hours: u8, minutes: u8, seconds: u8) {
        self.clock = (hours, minutes);
        self.dispatcher.send(Event::RedLine);
        self.dispatcher.send(Event::GenPlot);

        match self.settings.app {
            AppMode::Ook48 => {
                self.timing.on_pps(self.settings.rx_retard_ms);
            }
            AppMode::Jt4 | AppMode::Pi4 => {
                // Beacon frames span the minute; arm at its first second
                if seconds == 0 {
                    self.timing.on_pps(self.settings.rx_retard_ms);
                }
            }
            AppMode::Morse => {}
        }
    }

    /// The host saw `elapsed_ms` without a sample frame.
    pub fn note_dropout(&mut self, elapsed_ms: u32) {
        if self.timing.note_silence(elapsed_ms) {
            self.cache.reset(0);
        }
    }

    /// Process one oversampled ADC frame.
    pub fn ingest_frame(&mut self, adc_frame: &[u16]) {
        let mut magnitudes = std::mem::take(&mut self.magnitudes);
        if self.spectrum.process(adc_frame, &mut magnitudes).is_err() {
            // Partial DMA frame: skip without advancing the cache pointer
            trace!(len = adc_frame.len(), "partial ingest frame skipped");
            self.magnitudes = magnitudes;
            return;
        }

        let row = self.waterfall.scale_row(&magnitudes);
        self.dispatcher.send(Event::DrawSpectrum(row));

        if let ModeRuntime::Morse(_) = self.mode {
            self.morse_frame(&magnitudes);
            self.magnitudes = magnitudes;
            return;
        }

        match self.timing.on_frame() {
            FrameAction::Ignore => {}
            FrameAction::Discard => {
                let slot = self.pps_reset_slot();
                self.cache.reset(slot);
                debug!(slot, "cache armed on second boundary");
            }
            FrameAction::Capture => {
                let frame_ready = match &mut self.mode {
                    ModeRuntime::Ook48(_) => self.cache.push_column(&magnitudes, NO_LABEL),
                    ModeRuntime::Beacon(decoder) => {
                        let decision = tone_detect(
                            &magnitudes,
                            self.params.tone0,
                            self.params.tone_spacing,
                            self.params.tone_tolerance,
                        );
                        decoder.note_snr(decision.snr_db);
                        self.cache.push_column(&magnitudes, decision.tone)
                    }
                    ModeRuntime::Morse(_) => false,
                };
                if frame_ready {
                    self.timing.frame_complete();
                    self.dispatcher.send(Event::CyanLine);
                    self.decode_frame();
                    self.timing.frame_consumed();
                }
            }
        }
        self.magnitudes = magnitudes;
    }

    /// Write index after a PPS reset: half-rate keeps the second frame of a
    /// pair in the upper half of the cache.
    fn pps_reset_slot(&self) -> usize {
        if matches!(self.settings.app, AppMode::Ook48)
            && self.settings.half_rate
            && self.timing.odd_second()
        {
            8
        } else {
            0
        }
    }

    fn decode_frame(&mut self) {
        match &mut self.mode {
            ModeRuntime::Ook48(decoder) => {
                let result = decoder.decode_frame(&self.cache);
                self.dispatcher.send(Event::SoftMagnitudes(result.soft));
                match result.outcome {
                    Ook48Outcome::Decoded(ch) => self.dispatcher.send(Event::Message(ch)),
                    Ook48Outcome::LowConfidence => self
                        .dispatcher
                        .send(Event::Message(crate::constants::UNKNOWN_CHAR)),
                    Ook48Outcome::InvalidCode => self
                        .dispatcher
                        .send(Event::Error("invalid 4of8 word".to_string())),
                }
            }
            ModeRuntime::Beacon(decoder) => {
                let outcome = decoder.decode(self.cache.labels());
                let (hours, minutes) = self.clock;
                match outcome {
                    BeaconOutcome::Message { text, snr_db } => {
                        let report = BeaconReport {
                            hours,
                            minutes,
                            snr_db,
                            text,
                        };
                        let event = match decoder.mode() {
                            BeaconMode::Jt4 => Event::JtMessage(report),
                            BeaconMode::Pi4 => Event::PiMessage(report),
                        };
                        self.dispatcher.send(event);
                    }
                    BeaconOutcome::NoSync { mismatches } => {
                        debug!(mismatches, "beacon minute without sync");
                    }
                    BeaconOutcome::FanoTimeout => {
                        debug!("sequential decode gave up");
                    }
                }
            }
            ModeRuntime::Morse(_) => {}
        }
    }

    fn morse_frame(&mut self, magnitudes: &[f32]) {
        let lo = self.params.tone0 - self.params.tone_tolerance;
        let hi = self.params.tone0 + self.params.tone_tolerance;
        let magnitude = magnitudes[lo..hi].iter().fold(0.0f32, |a, &m| a.max(m));

        let mut events = std::mem::take(&mut self.morse_events);
        events.clear();
        if let ModeRuntime::Morse(decoder) = &mut self.mode {
            decoder.push(magnitude, &mut events);
        }
        for event in events.iter() {
            let out = match event {
                MorseEvent::Char(ch) => Event::MorseMessage(*ch),
                MorseEvent::WordSep => Event::MorseMessage(' '),
                MorseEvent::Locked(wpm) => Event::MorseLocked(*wpm),
                MorseEvent::Lost => Event::MorseLost,
            };
            self.dispatcher.send(out);
        }
        self.morse_events = events;
    }

    /// Load a message slot into the key stream and enter transmit.
    pub fn start_tx_message(&mut self, slot: usize) {
        let template = self.settings.message_slots[slot].clone();
        let bytes = compile_message(&template, &self.locator);
        self.key_stream = Some(KeyStream::new(bytes, self.settings.half_rate));
        self.transmitting = true;
    }

    pub fn stop_tx(&mut self) {
        self.key_stream = None;
        self.transmitting = false;
    }

    /// Milliseconds after a PPS edge at which the host starts the symbol
    /// timer, so the key stream leads the next second by `tx_advance`.
    pub fn tx_start_delay_ms(&self) -> u16 {
        1000 - self.settings.tx_advance_ms
    }

    /// One 1/9 s transmit timer tick: key line state for the next symbol.
    /// `None` once the message is finished (key released).
    pub fn tx_tick(&mut self) -> Option<bool> {
        let stream = self.key_stream.as_mut()?;
        match stream.next_bit() {
            Some(tick) => {
                if let Some(ch) = tick.completed {
                    self.dispatcher.send(Event::TxMessage(ch));
                }
                Some(tick.key_down)
            }
            None => {
                self.transmitting = false;
                self.key_stream = None;
                None
            }
        }
    }

    /// Key timeline for a CW transmission at the configured speed.
    pub fn morse_tx_timeline(&self, text: &str) -> Vec<KeySegment> {
        key_text(text, self.settings.morse_wpm)
    }

    /// Continuous-dash alignment carrier.
    pub fn dashes_timeline(&self, count: usize) -> Vec<KeySegment> {
        alignment_dashes(self.settings.morse_wpm, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::OOK48;
    use crate::ook48::tables::encode_char;
    use crate::simulation::{adc_silence_frame, adc_tone_frame};

    fn drain(rx: &Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    /// Feed one OOK48 second: the PPS, one spanning frame, then 8 keyed
    /// symbol frames for the given word.
    fn feed_second(engine: &mut Engine, word: u8, hours: u8, minutes: u8, seconds: u8) {
        engine.on_pps(hours, minutes, seconds);
        engine.ingest_frame(&adc_silence_frame(&OOK48));
        for bit in 0..8 {
            let frame = if word & (0x80 >> bit) != 0 {
                adc_tone_frame(&OOK48, OOK48.tone0, 600.0)
            } else {
                adc_silence_frame(&OOK48)
            };
            engine.ingest_frame(&frame);
        }
    }

    #[test]
    fn test_ook48_second_decodes_one_character() {
        let (mut engine, rx) = Engine::new(Settings::default());
        feed_second(&mut engine, encode_char(b'K'), 10, 0, 0);

        let events = drain(&rx);
        let soft_at = events
            .iter()
            .position(|e| matches!(e, Event::SoftMagnitudes(_)));
        let msg_at = events.iter().position(|e| *e == Event::Message('K'));
        assert!(soft_at.is_some(), "events: {:?}", events);
        assert!(msg_at.is_some(), "events: {:?}", events);
        // Soft magnitudes precede the decoded character
        assert!(soft_at.unwrap() < msg_at.unwrap());
    }

    #[test]
    fn test_no_decode_without_pps() {
        let (mut engine, rx) = Engine::new(Settings::default());
        for _ in 0..20 {
            engine.ingest_frame(&adc_tone_frame(&OOK48, OOK48.tone0, 600.0));
        }
        let events = drain(&rx);
        assert!(!events.iter().any(|e| matches!(e, Event::Message(_))));
        assert_eq!(engine.write_slot(), 0);
    }

    #[test]
    fn test_pps_resets_partial_frame() {
        let (mut engine, rx) = Engine::new(Settings::default());
        engine.on_pps(10, 0, 0);
        // Spanning frame plus three captured symbols
        for _ in 0..4 {
            engine.ingest_frame(&adc_silence_frame(&OOK48));
        }
        assert_eq!(engine.write_slot(), 3);
        engine.on_pps(10, 0, 1);
        engine.ingest_frame(&adc_silence_frame(&OOK48));
        assert_eq!(engine.write_slot(), 0);
        let events = drain(&rx);
        assert!(!events.iter().any(|e| matches!(e, Event::Message(_))));
    }

    #[test]
    fn test_free_run_reset_clears_write_index() {
        let (mut engine, _rx) = Engine::new(Settings::default());
        engine.on_pps(10, 0, 0);
        for _ in 0..4 {
            engine.ingest_frame(&adc_silence_frame(&OOK48));
        }
        assert!(engine.write_slot() > 0);
        engine.note_dropout(300);
        assert_eq!(engine.write_slot(), 0);
    }

    #[test]
    fn test_partial_adc_frame_is_skipped() {
        let (mut engine, rx) = Engine::new(Settings::default());
        engine.on_pps(10, 0, 0);
        engine.ingest_frame(&adc_silence_frame(&OOK48));
        engine.ingest_frame(&adc_silence_frame(&OOK48));
        let before = engine.write_slot();
        engine.ingest_frame(&[2048u16; 100]);
        assert_eq!(engine.write_slot(), before);
        drain(&rx);
    }

    #[test]
    fn test_half_rate_second_pair_decodes_once() {
        let settings = Settings {
            half_rate: true,
            ..Settings::default()
        };
        let (mut engine, rx) = Engine::new(settings);
        let word = encode_char(b'R');
        // Even second fills slots 0..8, odd second 8..16
        feed_second(&mut engine, word, 10, 0, 0);
        assert!(!drain(&rx).iter().any(|e| matches!(e, Event::Message(_))));
        feed_second(&mut engine, word, 10, 0, 1);
        let events = drain(&rx);
        assert!(
            events.iter().any(|e| *e == Event::Message('R')),
            "events: {:?}",
            events
        );
    }

    #[test]
    fn test_tx_stream_echoes_characters() {
        let mut settings = Settings::default();
        settings.message_slots[0] = "HI".to_string();
        let (mut engine, rx) = Engine::new(settings);
        engine.start_tx_message(0);
        assert!(engine.is_transmitting());

        let mut bits = Vec::new();
        while let Some(key_down) = engine.tx_tick() {
            bits.push(key_down);
        }
        // H, I and the CR terminator, 8 symbols each
        assert_eq!(bits.len(), 24);
        assert!(!engine.is_transmitting());
        let echoed: Vec<Event> = drain(&rx)
            .into_iter()
            .filter(|e| matches!(e, Event::TxMessage(_)))
            .collect();
        assert_eq!(
            echoed,
            vec![
                Event::TxMessage('H'),
                Event::TxMessage('I'),
                Event::TxMessage('\r')
            ]
        );
    }

    #[test]
    fn test_tx_advance_leads_the_second() {
        let settings = Settings {
            tx_advance_ms: 40,
            ..Settings::default()
        };
        let (engine, _rx) = Engine::new(settings);
        assert_eq!(engine.tx_start_delay_ms(), 960);
    }

    #[test]
    fn test_locator_expansion_uses_station_locator() {
        let mut settings = Settings::default();
        settings.message_slots[1] = "DE \u{86}".to_string();
        let (mut engine, rx) = Engine::new(settings);
        engine.set_locator("IO91WM");
        engine.start_tx_message(1);
        let mut count = 0;
        while engine.tx_tick().is_some() {
            count += 1;
        }
        // "DE IO91WM" + CR = 10 characters
        assert_eq!(count, 80);
        drain(&rx);
    }
}
