/// Runs `$body` with `$v` bound to whichever vector is active.
///
/// `$events` may be `&Events` or `&mut Events`; `$body` is expanded once per
/// representation, so it must type-check for all three.
macro_rules! with_events {
    ($events:expr, $v:ident => $body:expr) => {
        match $events {
            $crate::Events::Tof($v) => $body,
            $crate::Events::Weighted($v) => $body,
            $crate::Events::WeightedNoTime($v) => $body,
        }
    };
}
