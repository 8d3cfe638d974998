//! Sibling peripheral contracts of the SDK surface.
//!
//! These are leaf interfaces implemented by board support packages; they do
//! not interact with the connection manager.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::WirelessResult;

/// A piezo or DAC-backed tone generator
#[async_trait]
pub trait ToneGenerator: Send + Sync {
    /// Start a tone at `frequency_hz`. With a duration, the tone stops on
    /// its own; without one it plays until [`stop_tone`](Self::stop_tone).
    async fn play_tone(&mut self, frequency_hz: f32, duration: Option<Duration>)
        -> WirelessResult<()>;

    /// Stop the current tone, if any
    async fn stop_tone(&mut self) -> WirelessResult<()>;
}

/// The board's status LED
#[async_trait]
pub trait StatusLed: Send + Sync {
    async fn set_state(&mut self, on: bool) -> WirelessResult<()>;

    /// Brightness from 0.0 (off) to 1.0 (full)
    async fn set_brightness(&mut self, brightness: f32) -> WirelessResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct BenchBoard {
        tone: Option<f32>,
        led_on: bool,
    }

    #[async_trait]
    impl ToneGenerator for BenchBoard {
        async fn play_tone(
            &mut self,
            frequency_hz: f32,
            _duration: Option<Duration>,
        ) -> WirelessResult<()> {
            self.tone = Some(frequency_hz);
            Ok(())
        }

        async fn stop_tone(&mut self) -> WirelessResult<()> {
            self.tone = None;
            Ok(())
        }
    }

    #[async_trait]
    impl StatusLed for BenchBoard {
        async fn set_state(&mut self, on: bool) -> WirelessResult<()> {
            self.led_on = on;
            Ok(())
        }

        async fn set_brightness(&mut self, _brightness: f32) -> WirelessResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn contracts_are_object_safe_and_callable() {
        let mut board = BenchBoard::default();

        let tone: &mut dyn ToneGenerator = &mut board;
        tone.play_tone(440.0, Some(Duration::from_millis(250)))
            .await
            .unwrap();
        tone.stop_tone().await.unwrap();
        assert_eq!(board.tone, None);

        let led: &mut dyn StatusLed = &mut board;
        led.set_state(true).await.unwrap();
        assert!(board.led_on);
    }
}
