//! Which elements animate between which page types.

use std::fmt;

use deck_animation::AnimationType;
use deck_core::collections::map::HashMap;

use crate::layout_id::LayoutId;
use crate::transform::ElementTransform;

/// What part of an element's transform animates, and along which curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionAnimation {
    Scale(AnimationType),
    Position(AnimationType),
    /// Scale and position together.
    Bounds(AnimationType),
}

impl TransitionAnimation {
    pub fn scale() -> Self {
        TransitionAnimation::Scale(AnimationType::default())
    }

    pub fn position() -> Self {
        TransitionAnimation::Position(AnimationType::default())
    }

    pub fn bounds() -> Self {
        TransitionAnimation::Bounds(AnimationType::default())
    }

    pub fn curve(&self) -> AnimationType {
        match self {
            TransitionAnimation::Scale(curve)
            | TransitionAnimation::Position(curve)
            | TransitionAnimation::Bounds(curve) => *curve,
        }
    }

    /// Keeps only the animated part of `transform`.
    pub fn apply(&self, transform: ElementTransform) -> ElementTransform {
        match self {
            TransitionAnimation::Scale(_) => ElementTransform {
                offset: ElementTransform::IDENTITY.offset,
                ..transform
            },
            TransitionAnimation::Position(_) => ElementTransform {
                scale: ElementTransform::IDENTITY.scale,
                ..transform
            },
            TransitionAnimation::Bounds(_) => transform,
        }
    }
}

impl Default for TransitionAnimation {
    fn default() -> Self {
        Self::bounds()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionDirection {
    /// A page is pushed on top of the current one.
    Enter,
    /// The current page is popped, revealing the one below.
    Exit,
}

/// Elements animated by one transition, ordered by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionElements {
    pub current: Vec<(LayoutId, TransitionAnimation)>,
    pub target: Vec<(LayoutId, TransitionAnimation)>,
}

impl TransitionElements {
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.target.is_empty()
    }
}

type ElementMap = HashMap<LayoutId, TransitionAnimation>;

fn sorted(map: &ElementMap) -> Vec<(LayoutId, TransitionAnimation)> {
    let mut elements: Vec<_> = map.iter().map(|(id, animation)| (*id, *animation)).collect();
    elements.sort_by_key(|(id, _)| *id);
    elements
}

/// Elements of one page pair, split by direction and page.
#[derive(Debug, Clone, Default)]
pub struct TransitionSpec {
    enter_current: ElementMap,
    enter_target: ElementMap,
    exit_current: ElementMap,
    exit_target: ElementMap,
}

impl TransitionSpec {
    pub fn elements(&self, direction: TransitionDirection) -> TransitionElements {
        match direction {
            TransitionDirection::Enter => TransitionElements {
                current: sorted(&self.enter_current),
                target: sorted(&self.enter_target),
            },
            TransitionDirection::Exit => TransitionElements {
                current: sorted(&self.exit_current),
                target: sorted(&self.exit_target),
            },
        }
    }
}

/// Declares the enter and exit elements of a page pair.
pub struct TransitionBuilder<'a> {
    spec: &'a mut TransitionSpec,
}

impl TransitionBuilder<'_> {
    /// Elements animated when the destination page is pushed.
    pub fn enter(&mut self, declare: impl FnOnce(&mut ElementSetBuilder<'_>)) -> &mut Self {
        declare(&mut ElementSetBuilder {
            current: &mut self.spec.enter_current,
            target: &mut self.spec.enter_target,
        });
        self
    }

    /// Elements animated when the destination page is popped again.
    pub fn exit(&mut self, declare: impl FnOnce(&mut ElementSetBuilder<'_>)) -> &mut Self {
        declare(&mut ElementSetBuilder {
            current: &mut self.spec.exit_current,
            target: &mut self.spec.exit_target,
        });
        self
    }
}

pub struct ElementSetBuilder<'a> {
    current: &'a mut ElementMap,
    target: &'a mut ElementMap,
}

impl ElementSetBuilder<'_> {
    /// Element on the page shown when the transition starts.
    pub fn current_page_element(&mut self, id: LayoutId, animation: TransitionAnimation) -> &mut Self {
        self.current.insert(id, animation);
        self
    }

    /// Element on the page being navigated to.
    pub fn target_page_element(&mut self, id: LayoutId, animation: TransitionAnimation) -> &mut Self {
        self.target.insert(id, animation);
        self
    }
}

/// Transitions keyed by `(from tag, to tag)`, where `to` is the page pushed
/// on top of `from`.
#[derive(Default)]
pub struct PageTransitionRegistry {
    specs: HashMap<(&'static str, &'static str), TransitionSpec>,
}

impl PageTransitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares, from the page below, the transition to `to_tag`.
    pub fn transition_to(
        &mut self,
        from_tag: &'static str,
        to_tag: &'static str,
        declare: impl FnOnce(&mut TransitionBuilder<'_>),
    ) -> &mut Self {
        let spec = self.specs.entry((from_tag, to_tag)).or_default();
        declare(&mut TransitionBuilder { spec });
        self
    }

    /// Declares, from the destination page, the transition from `from_tag`.
    pub fn transition_from(
        &mut self,
        to_tag: &'static str,
        from_tag: &'static str,
        declare: impl FnOnce(&mut TransitionBuilder<'_>),
    ) -> &mut Self {
        self.transition_to(from_tag, to_tag, declare)
    }

    pub fn spec(&self, from_tag: &str, to_tag: &str) -> Option<&TransitionSpec> {
        self.specs
            .iter()
            .find(|((from, to), _)| *from == from_tag && *to == to_tag)
            .map(|(_, spec)| spec)
    }

    /// Elements to animate when navigating from a `current_tag` page to a
    /// `target_tag` page.
    pub fn resolve(
        &self,
        direction: TransitionDirection,
        current_tag: &str,
        target_tag: &str,
    ) -> Option<TransitionElements> {
        let spec = match direction {
            TransitionDirection::Enter => self.spec(current_tag, target_tag),
            TransitionDirection::Exit => self.spec(target_tag, current_tag),
        }?;
        Some(spec.elements(direction)).filter(|elements| !elements.is_empty())
    }
}

impl fmt::Debug for PageTransitionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<_> = self.specs.keys().collect();
        pairs.sort();
        f.debug_struct("PageTransitionRegistry")
            .field("pairs", &pairs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_animation::AnimationSpec;

    fn registry() -> PageTransitionRegistry {
        let avatar = LayoutId::named("avatar");
        let banner = LayoutId::named("banner");
        let mut registry = PageTransitionRegistry::new();
        registry.transition_to("feed", "profile", |t| {
            t.enter(|e| {
                e.current_page_element(avatar, TransitionAnimation::bounds())
                    .target_page_element(avatar, TransitionAnimation::bounds());
            });
            t.exit(|e| {
                e.current_page_element(banner, TransitionAnimation::Position(AnimationSpec::linear(200).into()));
            });
        });
        registry
    }

    #[test]
    fn enter_uses_pair_in_push_order() {
        let elements = registry()
            .resolve(TransitionDirection::Enter, "feed", "profile")
            .unwrap();
        assert_eq!(elements.current.len(), 1);
        assert_eq!(elements.target.len(), 1);
        assert!(registry()
            .resolve(TransitionDirection::Enter, "profile", "feed")
            .is_none());
    }

    #[test]
    fn exit_looks_up_the_reversed_pair() {
        let elements = registry()
            .resolve(TransitionDirection::Exit, "profile", "feed")
            .unwrap();
        assert_eq!(elements.current, vec![(
            LayoutId::named("banner"),
            TransitionAnimation::Position(AnimationSpec::linear(200).into())
        )]);
        assert!(elements.target.is_empty());
    }

    #[test]
    fn transition_from_fills_the_same_pair() {
        let mut registry = PageTransitionRegistry::new();
        registry.transition_from("profile", "feed", |t| {
            t.enter(|e| {
                e.target_page_element(LayoutId::named("avatar"), TransitionAnimation::scale());
            });
        });
        assert!(registry.spec("feed", "profile").is_some());
        assert!(registry
            .resolve(TransitionDirection::Exit, "profile", "feed")
            .is_none());
    }

    #[test]
    fn scale_only_animation_drops_offset() {
        let transform = ElementTransform {
            scale: deck_graphics::ScaleFactor::new(2.0, 2.0),
            offset: deck_graphics::Offset::new(5.0, 5.0),
        };
        let applied = TransitionAnimation::scale().apply(transform);
        assert_eq!(applied.offset, deck_graphics::Offset::ZERO);
        assert_eq!(applied.scale, transform.scale);
    }
}
