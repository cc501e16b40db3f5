use super::*;

/// Every character advances by the same amount, spaces included.
struct FixedAdvance(f32);

impl TextMeasure for FixedAdvance {
    fn measure(&mut self, text: &str) -> StoryreelResult<f32> {
        Ok(text.chars().count() as f32 * self.0)
    }
}

struct Failing;

impl TextMeasure for Failing {
    fn measure(&mut self, _text: &str) -> StoryreelResult<f32> {
        Err(StoryreelError::config("no font"))
    }
}

fn texts(lines: &CaptionLines) -> Vec<&str> {
    lines.iter().map(|l| l.text.as_str()).collect()
}

#[test]
fn wraps_at_width_boundary() {
    let lines = layout_caption("aa bb cc", 50.0, &mut FixedAdvance(10.0)).unwrap();
    assert_eq!(texts(&lines), vec!["aa bb", "cc"]);
    assert_eq!(lines[0].width, 50.0);
    assert_eq!(lines[1].width, 20.0);
}

#[test]
fn short_text_stays_on_one_line() {
    let lines = layout_caption("hello world", 1000.0, &mut FixedAdvance(10.0)).unwrap();
    assert_eq!(texts(&lines), vec!["hello world"]);
}

#[test]
fn over_wide_word_gets_its_own_line() {
    let lines = layout_caption("a incomprehensibilities b", 50.0, &mut FixedAdvance(10.0)).unwrap();
    assert_eq!(texts(&lines), vec!["a", "incomprehensibilities", "b"]);
    assert!(lines[1].width > 50.0);
}

#[test]
fn blank_text_yields_no_lines() {
    assert!(layout_caption("", 50.0, &mut FixedAdvance(10.0)).unwrap().is_empty());
    assert!(layout_caption("  \t\n ", 50.0, &mut FixedAdvance(10.0)).unwrap().is_empty());
}

#[test]
fn whitespace_runs_collapse_to_single_spaces() {
    let lines = layout_caption("  one\t two \n three ", 1000.0, &mut FixedAdvance(1.0)).unwrap();
    assert_eq!(texts(&lines), vec!["one two three"]);
}

#[test]
fn joined_lines_reproduce_word_sequence() {
    let text = "Ancient trade routes carried silk, spices, and stories across deserts and seas \
                for over a thousand years";
    for max in [40.0f32, 90.0, 150.0, 400.0] {
        let lines = layout_caption(text, max, &mut FixedAdvance(7.0)).unwrap();
        let joined = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(joined, text.split_whitespace().collect::<Vec<_>>().join(" "));
        for l in &lines {
            assert!(l.width <= max || !l.text.contains(' '));
        }
    }
}

#[test]
fn rejects_invalid_width() {
    assert!(layout_caption("a", 0.0, &mut FixedAdvance(1.0)).is_err());
    assert!(layout_caption("a", f32::NAN, &mut FixedAdvance(1.0)).is_err());
}

#[test]
fn measure_errors_propagate() {
    assert!(layout_caption("a b", 10.0, &mut Failing).is_err());
}

#[test]
fn line_centers_are_symmetric_about_anchor() {
    assert_eq!(line_centers(1, 998.4, 70.0), vec![998.4]);
    assert_eq!(line_centers(2, 1000.0, 70.0), vec![965.0, 1035.0]);
    let c = line_centers(3, 1000.0, 70.0);
    assert_eq!(c, vec![930.0, 1000.0, 1070.0]);
    assert!(line_centers(0, 1000.0, 70.0).is_empty());
}
