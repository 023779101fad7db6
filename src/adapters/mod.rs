//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements          | Connects to                 |
//! |---------------|---------------------|-----------------------------|
//! | `config_file` | ConfigPort          | JSON document on disk       |
//! | `fswebcam`    | CameraPort          | `fswebcam` process          |
//! | `hardware`    | all hardware ports  | one adapter per port        |
//! | `log_sink`    | EventSink           | `log` facade                |
//! | `relay_board` | ActuatorPort        | embedded-hal output pins    |
//! | `sim`         | Actuator, Camera,   | in-memory reactor model     |
//! |               | Sensor, ClockPort   |                             |
//! | `time`        | ClockPort           | system clock                |
//! | `values_file` | PhaseSource         | four-line `values.txt`      |

pub mod config_file;
pub mod fswebcam;
pub mod hardware;
pub mod log_sink;
pub mod relay_board;
pub mod sim;
pub mod time;
pub mod values_file;
