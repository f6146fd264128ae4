use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;

use crate::geometry::Point;

/// A scheduled sweep-line event. Circle events are keyed by the beach
/// line arc that will be squeezed out — that arc index is stable for the
/// sweep's lifetime (see `beachline::Beachline`), so it doubles as the
/// back-index handle the priority queue needs to delete invalidated
/// circle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Site(usize),
    Circle(usize),
}

/// Total order on events: greater y first, ties broken by lesser x, and
/// a final tie broken in favor of site events over circle events at
/// identical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventPriority {
    y: OrderedFloat<f64>,
    neg_x: OrderedFloat<f64>,
    site_before_circle: u8,
}

impl EventPriority {
    pub fn site(p: &Point) -> Self {
        Self {
            y: p.y,
            neg_x: -p.x,
            site_before_circle: 1,
        }
    }

    pub fn circle(circle_bottom_y: OrderedFloat<f64>, x: OrderedFloat<f64>) -> Self {
        Self {
            y: circle_bottom_y,
            neg_x: -x,
            site_before_circle: 0,
        }
    }
}

/// Payload carried by a live circle event: the vanishing arc, the
/// y-coordinate of the bottom of the circumscribed circle (the event's
/// own priority), and the circumcenter that will become the new vertex.
#[derive(Debug, Clone, Copy)]
pub struct CircleEventData {
    pub arc_idx: usize,
    pub bottom_y: OrderedFloat<f64>,
    pub center: Point,
}

/// Thin wrapper over [`PriorityQueue`] distinguishing site and circle
/// events and tracking the sites, so the driver can seed and dispatch
/// without reaching into the heap's internals.
pub struct EventQueue {
    sites: Vec<Point>,
    circles: Vec<Option<CircleEventData>>,
    queue: PriorityQueue<Event, EventPriority>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            sites: Vec::new(),
            circles: Vec::new(),
            queue: PriorityQueue::new(),
        }
    }

    pub fn push_site(&mut self, p: Point) -> usize {
        let idx = self.sites.len();
        self.sites.push(p);
        self.queue.push(Event::Site(idx), EventPriority::site(&p));
        idx
    }

    pub fn push_circle(&mut self, arc_idx: usize, bottom_y: OrderedFloat<f64>, center: Point) {
        let data = CircleEventData {
            arc_idx,
            bottom_y,
            center,
        };
        if arc_idx >= self.circles.len() {
            self.circles.resize(arc_idx + 1, None);
        }
        self.circles[arc_idx] = Some(data);
        self.queue
            .push(Event::Circle(arc_idx), EventPriority::circle(bottom_y, center.x));
    }

    /// Invalidate the circle event pending on `arc_idx`, if any.
    pub fn cancel_circle(&mut self, arc_idx: usize) {
        self.queue.remove(&Event::Circle(arc_idx));
        if let Some(slot) = self.circles.get_mut(arc_idx) {
            *slot = None;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pop(&mut self) -> Option<DispatchedEvent> {
        let (event, _) = self.queue.pop()?;
        match event {
            Event::Site(idx) => Some(DispatchedEvent::Site(self.sites[idx])),
            Event::Circle(arc_idx) => {
                let data = self.circles[arc_idx].take()?;
                Some(DispatchedEvent::Circle(data))
            }
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

pub enum DispatchedEvent {
    Site(Point),
    Circle(CircleEventData),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_events_precede_circle_events_at_equal_coordinates() {
        let mut eq = EventQueue::new();
        let p = Point::from_xy(1.0, 1.0);
        eq.push_circle(0, OrderedFloat(1.0), p);
        eq.push_site(p);

        match eq.pop() {
            Some(DispatchedEvent::Site(_)) => {}
            _ => panic!("expected site event to be popped first"),
        }
    }

    #[test]
    fn greater_y_pops_first_then_lesser_x() {
        let mut eq = EventQueue::new();
        eq.push_site(Point::from_xy(5.0, 1.0));
        eq.push_site(Point::from_xy(0.0, 3.0));
        eq.push_site(Point::from_xy(-1.0, 3.0));

        let first = eq.pop();
        match first {
            Some(DispatchedEvent::Site(p)) => assert_eq!(p, Point::from_xy(-1.0, 3.0)),
            _ => panic!("expected a site event"),
        }
    }

    #[test]
    fn cancel_circle_removes_pending_event() {
        let mut eq = EventQueue::new();
        eq.push_circle(0, OrderedFloat(5.0), Point::from_xy(0.0, 5.0));
        eq.cancel_circle(0);
        assert!(eq.is_empty());
        eq.cancel_circle(0); // idempotent
    }
}
