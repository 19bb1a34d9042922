use crate::capability::{
    EventSender, NarrationEvent, SpeechOptions, SpeechSynthesizer, UtteranceTicket,
};
use crate::error::{NarrationError, NarrationResult};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

type UnitHook = Box<dyn FnMut(&str, &SpeechOptions) + Send>;

/// How long `text` takes to say at `words_per_minute` scaled by `rate`
pub fn speaking_time(text: &str, words_per_minute: u32, rate: f32) -> Duration {
    let words = text.split_whitespace().count().max(1) as f32;
    let per_minute = (words_per_minute as f32 * rate).max(1.0);
    Duration::from_secs_f32(words * 60.0 / per_minute)
}

/// Speech capability that hands each unit to a hook and reports it done
/// after a speaking-time estimate
///
/// Must be driven from inside a tokio runtime.
pub struct PacedSpeech {
    events: EventSender,
    words_per_minute: u32,
    on_unit: UnitHook,
    in_flight: Option<(UtteranceTicket, JoinHandle<()>)>,
}

impl PacedSpeech {
    pub fn new(events: EventSender, words_per_minute: u32) -> Self {
        Self {
            events,
            words_per_minute,
            on_unit: Box::new(|_, _| {}),
            in_flight: None,
        }
    }

    /// Called with every unit as it starts
    pub fn with_hook(mut self, hook: impl FnMut(&str, &SpeechOptions) + Send + 'static) -> Self {
        self.on_unit = Box::new(hook);
        self
    }
}

impl SpeechSynthesizer for PacedSpeech {
    fn speak(
        &mut self,
        text: &str,
        options: &SpeechOptions,
        ticket: UtteranceTicket,
    ) -> NarrationResult<()> {
        let runtime =
            Handle::try_current().map_err(|e| NarrationError::capability("speech", e.to_string()))?;

        if let Some((_, previous)) = self.in_flight.take() {
            previous.abort();
        }

        (self.on_unit)(text, options);
        let delay = speaking_time(text, self.words_per_minute, options.rate);
        let events = self.events.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(NarrationEvent::speech_done(ticket));
        });

        self.in_flight = Some((ticket, task));
        Ok(())
    }

    fn stop_all(&mut self) {
        let Some((ticket, task)) = self.in_flight.take() else {
            return;
        };
        if !task.is_finished() {
            task.abort();
            let _ = self.events.send(NarrationEvent::speech_stopped(ticket));
        }
    }
}

impl Drop for PacedSpeech {
    fn drop(&mut self) {
        if let Some((_, task)) = self.in_flight.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{event_channel, SpeechOutcome};
    use std::sync::{Arc, Mutex};

    fn options() -> SpeechOptions {
        SpeechOptions {
            pitch: 1.0,
            rate: 1.0,
            language: "en-US".to_string(),
        }
    }

    #[test]
    fn test_speaking_time_scales_with_rate() {
        let text = "one two three four five six";
        assert_eq!(speaking_time(text, 120, 1.0), Duration::from_secs(3));
        assert_eq!(speaking_time(text, 120, 2.0), Duration::from_millis(1500));
    }

    #[test]
    fn test_blank_text_counts_as_one_word() {
        assert_eq!(speaking_time("", 60, 1.0), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_done_after_estimate() {
        let (tx, mut rx) = event_channel();
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&spoken);
        let mut speech = PacedSpeech::new(tx, 60)
            .with_hook(move |text, _| sink.lock().unwrap().push(text.to_string()));
        let ticket = UtteranceTicket {
            generation: 1,
            unit: 0,
        };

        let started = tokio::time::Instant::now();
        speech.speak("Hello there.", &options(), ticket).unwrap();
        let event = rx.recv().await.unwrap();

        assert_eq!(event, NarrationEvent::speech_done(ticket));
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(*spoken.lock().unwrap(), vec!["Hello there."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_reports_stopped() {
        let (tx, mut rx) = event_channel();
        let mut speech = PacedSpeech::new(tx, 60);
        let ticket = UtteranceTicket {
            generation: 3,
            unit: 2,
        };

        speech.speak("A fairly long sentence.", &options(), ticket).unwrap();
        speech.stop_all();

        match rx.recv().await.unwrap() {
            NarrationEvent::Speech { ticket: t, outcome } => {
                assert_eq!(t, ticket);
                assert_eq!(outcome, SpeechOutcome::Stopped);
            }
            other => panic!("unexpected event {:?}", other),
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_speak_outside_runtime_is_a_capability_error() {
        let (tx, _rx) = event_channel();
        let mut speech = PacedSpeech::new(tx, 160);
        let ticket = UtteranceTicket {
            generation: 0,
            unit: 0,
        };

        let err = speech.speak("Hi.", &options(), ticket).unwrap_err();
        assert!(err.is_recoverable());
    }
}
